/// Deterministic, pure text clean-up applied before embedding.
pub trait TextNormalizer {
    fn normalize(&self, text: &str) -> String;
}

/// Common English stop words removed by `BasicNormalizer`. Negations are
/// kept because they flip sentiment.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "so", "of", "at", "by",
    "for", "with", "about", "to", "from", "in", "on", "into", "over", "under",
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "do", "does", "did", "i", "me", "my", "we", "our", "you", "your",
    "he", "him", "his", "she", "her", "it", "its", "they", "them", "their",
    "this", "that", "these", "those", "what", "which", "who", "whom", "as",
    "just", "than", "too", "very", "can", "will", "would", "there", "here",
];

/// Lowercases, drops URLs and @mentions, replaces punctuation with spaces,
/// removes stop words and collapses whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicNormalizer;

impl BasicNormalizer {
    fn is_dropped_token(token: &str) -> bool {
        token.starts_with("http://")
            || token.starts_with("https://")
            || token.starts_with("www.")
            || token.starts_with('@')
    }
}

impl TextNormalizer for BasicNormalizer {
    fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let kept: String = lowered
            .split_whitespace()
            .filter(|t| !Self::is_dropped_token(t))
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned: String = kept
            .chars()
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
            .collect();
        cleaned
            .split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}
