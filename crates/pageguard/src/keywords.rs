//! Keyword filter: case-insensitive substring match against a fixed list.

/// Keywords flagged when no list is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &["hate", "bad", "attack"];

/// A case-insensitive substring filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl KeywordFilter {
    /// Build a filter; keywords are lowercased and blank entries dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when the lowercased text contains any keyword.
    pub fn is_harmful(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Every keyword present in `text`, in list order.
    pub fn matches(&self, text: &str) -> Vec<&str> {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}
