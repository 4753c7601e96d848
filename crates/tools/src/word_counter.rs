use serde::Serialize;
use ts_rs::TS;

const WORDS_PER_MINUTE: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
pub struct TextStats {
    pub words: usize,
    pub chars: usize,
    pub chars_no_space: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    /// Rounded to two decimals.
    pub reading_minutes: f64,
}

pub fn text_stats(text: &str) -> TextStats {
    let trimmed = text.trim();

    let words = trimmed.split_whitespace().count();
    let chars = trimmed.chars().count();
    let chars_no_space = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    let sentences = trimmed
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let paragraphs = trimmed
        .split('\n')
        .filter(|p| !p.trim().is_empty())
        .count();
    let reading_minutes = if words > 0 {
        (words as f64 / WORDS_PER_MINUTE * 100.0).round() / 100.0
    } else {
        0.0
    };

    TextStats {
        words,
        chars,
        chars_no_space,
        sentences,
        paragraphs,
        reading_minutes,
    }
}
