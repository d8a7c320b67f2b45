//! Noun candidates for the character frequency pass.
//!
//! The extractor only needs a bag of nouns, so the analyzer sits behind a
//! trait: callers with a real morphological analyzer can plug it in, and the
//! built-in [`HangulNounAnalyzer`] covers the common case by peeling trailing
//! particles and verb endings off Hangul words.

use once_cell::sync::Lazy;
use regex::Regex;

use scriptlens_core::Result;

/// Produces the nouns of a text, one entry per occurrence.
pub trait NounAnalyzer: Send + Sync {
    fn nouns(&self, text: &str) -> Result<Vec<String>>;
}

static HANGUL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[가-힣]+").unwrap());

/// Trailing particles and endings, stripped longest first.
const SUFFIXES: &[&str] = &[
    // endings
    "입니다", "습니다", "했습니다", "합니다", "이었다", "였다", "했다", "한다", "하는",
    "이다", "이야", "이에요", "예요", "에요", "이요",
    // particles
    "에서는", "에게서", "으로는", "한테서", "께서는", "이라고", "라고",
    "에서", "에게", "한테", "께서", "으로", "까지", "부터", "처럼", "보다", "이랑", "하고",
    "마저", "조차", "밖에", "은", "는", "이", "가", "을", "를", "의", "에", "와", "과",
    "도", "로", "만", "랑", "님",
];

/// Suffix-stripping noun analyzer for Hangul text.
///
/// Non-Hangul tokens are ignored. A suffix is only removed when at least one
/// syllable remains; "님" is treated as a suffix so "반장님" and "반장" count
/// together.
pub struct HangulNounAnalyzer {
    suffixes: Vec<&'static str>,
}

impl HangulNounAnalyzer {
    pub fn new() -> Self {
        let mut suffixes: Vec<&'static str> = SUFFIXES.to_vec();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        Self { suffixes }
    }

    /// Strip the longest matching suffix from a single Hangul word.
    pub fn stem<'a>(&self, word: &'a str) -> &'a str {
        for suffix in &self.suffixes {
            if word.len() > suffix.len() && word.ends_with(suffix) {
                return &word[..word.len() - suffix.len()];
            }
        }
        word
    }
}

impl Default for HangulNounAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl NounAnalyzer for HangulNounAnalyzer {
    fn nouns(&self, text: &str) -> Result<Vec<String>> {
        Ok(HANGUL_WORD
            .find_iter(text)
            .map(|m| self.stem(m.as_str()).to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_strips_longest_suffix() {
        let a = HangulNounAnalyzer::new();
        assert_eq!(a.stem("형사가"), "형사");
        assert_eq!(a.stem("사무실에서"), "사무실");
        assert_eq!(a.stem("반장님"), "반장");
        assert_eq!(a.stem("학생입니다"), "학생");
    }

    #[test]
    fn test_stem_keeps_at_least_one_syllable() {
        let a = HangulNounAnalyzer::new();
        assert_eq!(a.stem("이"), "이");
        assert_eq!(a.stem("나는"), "나");
    }

    #[test]
    fn test_nouns_ignore_latin() {
        let a = HangulNounAnalyzer::new();
        let nouns = a.nouns("MINA: 형사는 OFFICE 에서 형사를 만난다").unwrap();
        assert_eq!(nouns.iter().filter(|n| *n == "형사").count(), 2);
        assert!(!nouns.iter().any(|n| n.contains("MINA")));
    }
}
