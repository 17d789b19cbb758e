//! `pageguard vocab`: build a vocabulary from CSV text columns.

use crate::cli::output::{self, Styled};
use anyhow::{anyhow, Context, Result};
use pageguard::Vocabulary;
use std::path::PathBuf;

/// A CSV path and the zero-based index of its text column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSource {
    pub path: PathBuf,
    pub column: usize,
}

impl std::str::FromStr for ColumnSource {
    type Err = anyhow::Error;

    /// Parse `PATH:COLUMN_INDEX`, splitting at the last colon.
    fn from_str(s: &str) -> Result<Self> {
        let (path, column) = s
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("expected PATH:COLUMN_INDEX, got '{s}'"))?;
        if path.is_empty() {
            return Err(anyhow!("expected PATH:COLUMN_INDEX, got '{s}'"));
        }
        let column = column
            .parse()
            .with_context(|| format!("invalid column index in '{s}'"))?;
        Ok(Self {
            path: PathBuf::from(path),
            column,
        })
    }
}

/// Build the vocabulary and write it to `out`, or print it.
pub async fn run(sources: Vec<ColumnSource>, out: Option<PathBuf>) -> Result<()> {
    let paths: Vec<PathBuf> = sources.iter().map(|s| s.path.clone()).collect();
    let columns: Vec<usize> = sources.iter().map(|s| s.column).collect();
    let vocab = Vocabulary::from_sources(&paths, &columns);

    match &out {
        Some(file) => {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            vocab
                .save(file)
                .with_context(|| format!("writing {}", file.display()))?;
        }
        None if !output::is_json() => {
            for (token, index) in vocab.iter() {
                println!("{index}\t{token}");
            }
        }
        None => {}
    }

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "tokens": vocab.len(),
            "written": out.as_ref().map(|p| p.display().to_string()),
        }));
    } else if !output::is_quiet() {
        let s = Styled::new();
        eprintln!(
            "  {} Vocabulary of {} tokens from {} source(s)",
            s.ok_sym(),
            vocab.len(),
            sources.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_source() {
        let src: ColumnSource = "data/a.csv:2".parse().unwrap();
        assert_eq!(src.path, PathBuf::from("data/a.csv"));
        assert_eq!(src.column, 2);

        let src: ColumnSource = "C:/data/a.csv:0".parse().unwrap();
        assert_eq!(src.path, PathBuf::from("C:/data/a.csv"));
        assert_eq!(src.column, 0);
    }

    #[test]
    fn test_parse_column_source_errors() {
        assert!("data.csv".parse::<ColumnSource>().is_err());
        assert!("data.csv:x".parse::<ColumnSource>().is_err());
        assert!(":1".parse::<ColumnSource>().is_err());
    }

    #[tokio::test]
    async fn test_writes_vocabulary_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("d.csv");
        std::fs::write(&csv, "id,text\n1,Hello world\n2,hello again\n").unwrap();
        let out = dir.path().join("vocab.json");

        run(
            vec![ColumnSource {
                path: csv,
                column: 1,
            }],
            Some(out.clone()),
        )
        .await
        .unwrap();

        let vocab = Vocabulary::load(&out).unwrap();
        assert_eq!(vocab.index_of("hello"), 1);
        assert_eq!(vocab.index_of("world"), 2);
        assert_eq!(vocab.index_of("again"), 3);
    }
}
