//! Text chunking for analysis.
//!
//! Short documents are packed word by word into segments of at most
//! `max_chunk_size` characters. Long documents are sampled instead: a head
//! window, a window around the midpoint and a tail window, with everything in
//! between dropped. All sizes count Unicode scalar values, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Documents longer than this (in chars) are sampled rather than packed.
pub const SAMPLING_THRESHOLD: usize = 16_000;
/// Sampled head window.
pub const SAMPLE_HEAD: usize = 5_000;
/// Sampled middle window, centred on the midpoint.
pub const SAMPLE_MIDDLE: usize = 3_000;
/// Sampled tail window.
pub const SAMPLE_TAIL: usize = 5_000;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static PAGE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\s*/\s*\d+\b").unwrap());

/// Split text into segments for downstream processing.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.chars().count() > SAMPLING_THRESHOLD {
        let [head, middle, tail] = sample_windows(text, SAMPLE_HEAD, SAMPLE_MIDDLE, SAMPLE_TAIL);
        return vec![head, middle, tail];
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for word in text.split_whitespace() {
        let word_size = word.chars().count() + 1;
        if current_size + word_size > max_chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_size = 0;
        }
        current.push(word);
        current_size += word_size;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

/// Take a head window, a window centred on the midpoint and a tail window.
///
/// Windows are clamped to the text; on short input they may overlap.
pub fn sample_windows(text: &str, head: usize, middle: usize, tail: usize) -> [String; 3] {
    let len = text.chars().count();
    let mid_start = (len / 2).saturating_sub(middle / 2);
    [
        char_slice(text, 0, head),
        char_slice(text, mid_start, mid_start + middle),
        char_slice(text, len.saturating_sub(tail), len),
    ]
}

/// Collapse whitespace runs to single spaces and drop `n / m` page markers.
pub fn clean_script_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text, " ");
    PAGE_MARKER.replace_all(&collapsed, "").trim().to_string()
}

/// The first `n` chars of `text`.
pub fn head_chars(text: &str, n: usize) -> String {
    char_slice(text, 0, n)
}

/// The last `n` chars of `text`.
pub fn tail_chars(text: &str, n: usize) -> String {
    let len = text.chars().count();
    char_slice(text, len.saturating_sub(n), len)
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n\t ", 100).is_empty());
    }

    #[test]
    fn test_packing_preserves_words_in_order() {
        let text = "INT. OFFICE - DAY\n\nMINA:  We go tonight.\nJOON: Not without the key.";
        let chunks = chunk_text(text, 16);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(!c.is_empty());
        }

        let rejoined: Vec<&str> = chunks.iter().flat_map(|c| c.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_chunk_sizes_respect_limit() {
        let text = "가나다 라마 바사아자 차카 타파하 ".repeat(200);
        for chunk in chunk_text(&text, 50) {
            assert!(chunk.chars().count() < 50);
        }
    }

    #[test]
    fn test_oversized_word_is_its_own_segment() {
        let long = "x".repeat(30);
        let text = format!("{} short words", long);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks[0], long);
        assert_eq!(chunks[1], "short");
        assert_eq!(chunks[2], "words");
    }

    #[test]
    fn test_long_input_is_sampled() {
        let text: String = (0..20_000).map(|i| if i % 7 == 0 { '장' } else { 'a' }).collect();
        let chunks = chunk_text(&text, 8000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), SAMPLE_HEAD);
        assert_eq!(chunks[1].chars().count(), SAMPLE_MIDDLE);
        assert_eq!(chunks[2].chars().count(), SAMPLE_TAIL);
        assert_eq!(chunks[1], char_slice(&text, 8_500, 11_500));
        assert!(text.ends_with(&chunks[2]));
    }

    #[test]
    fn test_sampling_threshold_is_exclusive() {
        let text = "a".repeat(SAMPLING_THRESHOLD);
        assert_eq!(chunk_text(&text, SAMPLING_THRESHOLD + 1).len(), 1);
    }

    #[test]
    fn test_clean_script_text() {
        let raw = "1. INT. OFFICE\n\n  MINA: Go.   3 / 120\nJOON: Now.";
        assert_eq!(clean_script_text(raw), "1. INT. OFFICE MINA: Go.  JOON: Now.");
    }

    #[test]
    fn test_head_and_tail() {
        assert_eq!(head_chars("반장님 안녕", 3), "반장님");
        assert_eq!(tail_chars("반장님 안녕", 2), "안녕");
        assert_eq!(tail_chars("ab", 5), "ab");
    }
}
