//! CSV dataset loading for training and vocabulary building.

use crate::error::{GuardError, Result};
use crate::text::clean_text;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info, warn};

/// One CSV file plus the names of its text and label columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub path: PathBuf,
    pub text_column: String,
    pub label_column: String,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>, text_column: &str, label_column: &str) -> Self {
        Self {
            path: path.into(),
            text_column: text_column.to_string(),
            label_column: label_column.to_string(),
        }
    }

    /// The three corpora the stock model is trained on.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("./data/archive/train.csv", "tweet", "class"),
            Self::new("./data/archive 3/Liar_Dataset.csv", "statement", "label"),
            Self::new("./data/archive 2/cyberbullying.csv", "tweet", "label"),
        ]
    }
}

impl FromStr for DatasetSource {
    type Err = GuardError;

    /// Parse `PATH:TEXT_COLUMN:LABEL_COLUMN`, splitting from the right so
    /// the path itself may contain colons.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.rsplitn(3, ':');
        let label = parts.next().unwrap_or("");
        let text = parts.next().unwrap_or("");
        let path = parts.next().unwrap_or("");
        if path.is_empty() || text.is_empty() || label.is_empty() {
            return Err(GuardError::InvalidDatasetSource(s.to_string()));
        }
        Ok(Self::new(path, text, label))
    }
}

/// A cleaned text with its integer class label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledText {
    pub text: String,
    pub label: i64,
}

impl LabeledText {
    /// Binary target: any non-zero label counts as harmful.
    pub fn is_positive(&self) -> bool {
        self.label != 0
    }
}

/// Parse the leading integer of `s`, ignoring surrounding whitespace.
///
/// `"12abc"` → 12, `" -3 "` → -3, `"1.5"` → 1, `"abc"` → `None`.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| sign * v)
}

fn column_position(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Load one labeled dataset. Text is cleaned; rows without the expected
/// columns or with a non-numeric label are skipped.
pub fn load_dataset(source: &DatasetSource) -> Result<Vec<LabeledText>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&source.path)?;
    let headers = reader.headers()?.clone();

    let text_idx = column_position(&headers, &source.text_column).ok_or_else(|| {
        GuardError::MissingColumn {
            path: source.path.clone(),
            column: source.text_column.clone(),
        }
    })?;
    let label_idx = column_position(&headers, &source.label_column).ok_or_else(|| {
        GuardError::MissingColumn {
            path: source.path.clone(),
            column: source.label_column.clone(),
        }
    })?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("{}: unreadable row: {e}", source.path.display());
                skipped += 1;
                continue;
            }
        };
        let (Some(text), Some(label)) = (
            record.get(text_idx),
            record.get(label_idx).and_then(parse_leading_int),
        ) else {
            skipped += 1;
            continue;
        };
        samples.push(LabeledText {
            text: clean_text(text),
            label,
        });
    }

    if skipped > 0 {
        warn!(
            "{}: skipped {skipped} rows with missing text or non-numeric label",
            source.path.display()
        );
    }
    info!("{}: loaded {} rows", source.path.display(), samples.len());

    Ok(samples)
}

/// Load and concatenate several datasets in order.
pub fn load_all(sources: &[DatasetSource]) -> Result<Vec<LabeledText>> {
    let mut all = Vec::new();
    for source in sources {
        all.extend(load_dataset(source)?);
    }
    Ok(all)
}

/// Read the column at `column_index` from every row after the header.
///
/// Empty values are dropped. Failures are logged and yield an empty list.
pub fn load_text_column(path: &Path, column_index: usize) -> Vec<String> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(r) => r,
        Err(e) => {
            error!("error loading dataset from {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut texts = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                if let Some(value) = record.get(column_index) {
                    if !value.is_empty() {
                        texts.push(value.to_string());
                    }
                }
            }
            Err(e) => {
                error!("error loading dataset from {}: {e}", path.display());
                return Vec::new();
            }
        }
    }
    texts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("1"), Some(1));
        assert_eq!(parse_leading_int(" 2 "), Some(2));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("12abc"), Some(12));
        assert_eq!(parse_leading_int("1.5"), Some(1));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_dataset_spec_parse() {
        let src: DatasetSource = "data/train.csv:tweet:class".parse().unwrap();
        assert_eq!(src.path, PathBuf::from("data/train.csv"));
        assert_eq!(src.text_column, "tweet");
        assert_eq!(src.label_column, "class");

        let win: DatasetSource = r"C:\data\t.csv:text:label".parse().unwrap();
        assert_eq!(win.path, PathBuf::from(r"C:\data\t.csv"));

        assert!("train.csv:tweet".parse::<DatasetSource>().is_err());
        assert!("train.csv::class".parse::<DatasetSource>().is_err());
    }

    #[test]
    fn test_load_dataset_by_column_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "d.csv",
            "id,tweet,class\n1,\"Hello, <b>World</b>!\",0\n2,I HATE this,2\n3,no label,\n4,odd label,x\n",
        );
        let rows = load_dataset(&DatasetSource::new(&path, "tweet", "class")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "hello world");
        assert!(!rows[0].is_positive());
        assert_eq!(rows[1].text, "i hate this");
        assert_eq!(rows[1].label, 2);
        assert!(rows[1].is_positive());
    }

    #[test]
    fn test_load_dataset_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "d.csv", "text,label\nhi,0\n");
        let err = load_dataset(&DatasetSource::new(&path, "tweet", "label")).unwrap_err();
        assert!(matches!(err, GuardError::MissingColumn { ref column, .. } if column == "tweet"));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(&DatasetSource::new("/nonexistent/x.csv", "t", "l")).unwrap_err();
        assert!(matches!(err, GuardError::Csv(_)));
    }

    #[test]
    fn test_load_all_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "t,l\nfirst,1\n");
        let b = write_csv(dir.path(), "b.csv", "l,t\n0,second\n");
        let rows = load_all(&[
            DatasetSource::new(&a, "t", "l"),
            DatasetSource::new(&b, "t", "l"),
        ])
        .unwrap();
        let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_load_text_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "d.csv", "a,b\nx,1\n,2\ny,3\n");
        assert_eq!(load_text_column(&path, 0), vec!["x", "y"]);
        assert_eq!(load_text_column(&path, 1), vec!["1", "2", "3"]);
        assert!(load_text_column(&path, 5).is_empty());
    }

    #[test]
    fn test_load_text_column_missing_file_is_empty() {
        assert!(load_text_column(Path::new("/nonexistent/file.csv"), 0).is_empty());
    }
}
