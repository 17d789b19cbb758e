//! Fixed-length token sequences fed to the classifier.

use crate::vocab::{Vocabulary, UNKNOWN_INDEX};

/// Length of every sequence the classifier consumes.
pub const MAX_SEQUENCE_LENGTH: usize = 50;

/// Truncate `encoded` to `len` entries, then zero-fill on the right.
pub fn pad_sequence(encoded: &[u32], len: usize) -> Vec<u32> {
    let mut padded = Vec::with_capacity(len);
    padded.extend(encoded.iter().take(len).copied());
    padded.resize(len, UNKNOWN_INDEX);
    padded
}

/// Encode `text` with `vocab` and pad it to [`MAX_SEQUENCE_LENGTH`].
pub fn preprocess(text: &str, vocab: &Vocabulary) -> Vec<u32> {
    pad_sequence(&vocab.encode(text), MAX_SEQUENCE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sequence_is_zero_padded() {
        let padded = pad_sequence(&[4, 5, 6], MAX_SEQUENCE_LENGTH);
        assert_eq!(padded.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(&padded[..3], &[4, 5, 6]);
        assert!(padded[3..].iter().all(|&i| i == 0));
    }

    #[test]
    fn test_long_sequence_is_truncated() {
        let encoded: Vec<u32> = (1..=120).collect();
        let padded = pad_sequence(&encoded, MAX_SEQUENCE_LENGTH);
        assert_eq!(padded.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(padded[0], 1);
        assert_eq!(padded[49], 50);
    }

    #[test]
    fn test_lengths_always_exact() {
        for n in [0usize, 1, 49, 50, 51, 500] {
            let encoded = vec![7u32; n];
            assert_eq!(pad_sequence(&encoded, MAX_SEQUENCE_LENGTH).len(), MAX_SEQUENCE_LENGTH);
        }
    }

    #[test]
    fn test_preprocess_marks_unknown_tokens() {
        let vocab = Vocabulary::from_texts(["good morning"]);
        let seq = preprocess("Good evening, MORNING!", &vocab);
        assert_eq!(seq.len(), MAX_SEQUENCE_LENGTH);
        assert_eq!(&seq[..3], &[1, 0, 2]);
    }

    #[test]
    fn test_preprocess_empty_text() {
        let vocab = Vocabulary::from_texts(["anything"]);
        assert_eq!(preprocess("", &vocab), vec![0; MAX_SEQUENCE_LENGTH]);
    }
}
