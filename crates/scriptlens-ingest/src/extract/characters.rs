//! Character name extraction from script text.
//!
//! Three independent frequency passes each produce a name → count map:
//! "name + title" mentions, dialogue speaker cues, and frequent nouns. The
//! maps are summed and the most frequent names returned.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::nouns::NounAnalyzer;
use scriptlens_core::{ExtractionThresholds, Result};
use scriptlens_store::CharacterCount;

/// Name → occurrence count.
pub type Counts = HashMap<String, usize>;

/// Korean job and rank titles that follow a short family or given name.
pub const TITLES: &[&str] = &[
    "반장", "형사", "선생", "부장", "과장", "대리", "사장", "회장", "팀장", "사원", "대표",
    "실장", "소장", "상무", "이사", "부사장", "사무관", "교수", "차장", "본부장", "원장", "청장",
    "주임", "총리", "장관", "총장", "국장", "계장", "팀원", "부원장", "서기관", "검사", "변호사",
    "의사", "간호사", "조교", "경위", "순경", "경사", "경감", "경정", "총경", "경무관", "교장",
    "강사", "교감", "교사",
];

static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b([가-힣]{{1,2}})\s({})\b", TITLES.join("|"))).unwrap()
});

static SPEAKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*([가-힣A-Za-z][가-힣A-Za-z ]{0,9}?)[ \t]*:").unwrap()
});

/// Count "name title" mentions such as "고 반장", keeping those seen at least `min_count` times.
pub fn title_pass(text: &str, min_count: usize) -> Counts {
    let mut counts = Counts::new();
    for cap in TITLE_PATTERN.captures_iter(text) {
        let name = format!("{} {}", &cap[1], &cap[2]);
        *counts.entry(name).or_insert(0) += 1;
    }
    counts.retain(|_, c| *c >= min_count);
    counts
}

/// Count speaker cues (`NAME:` at the start of a line).
pub fn speaker_pass(text: &str, min_count: usize, min_len: usize) -> Counts {
    let mut counts = Counts::new();
    for cap in SPEAKER_PATTERN.captures_iter(text) {
        let name = cap[1].trim();
        if name.chars().count() >= min_len {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts.retain(|_, c| *c >= min_count);
    counts
}

/// Count nouns produced by `analyzer`, dropping short and excluded ones.
pub fn noun_pass(
    text: &str,
    analyzer: &dyn NounAnalyzer,
    min_count: usize,
    min_len: usize,
    exclusions: &HashSet<String>,
) -> Result<Counts> {
    let mut counts = Counts::new();
    for noun in analyzer.nouns(text)? {
        if noun.chars().count() >= min_len && !exclusions.contains(&noun) {
            *counts.entry(noun).or_insert(0) += 1;
        }
    }
    counts.retain(|_, c| *c >= min_count);
    Ok(counts)
}

/// Sum pass results and return the `top_n` names by combined count.
///
/// Ties are broken by name so the result does not depend on pass order.
pub fn merge_counts(passes: &[Counts], top_n: usize) -> Vec<CharacterCount> {
    let mut total = Counts::new();
    for pass in passes {
        for (name, count) in pass {
            *total.entry(name.clone()).or_insert(0) += count;
        }
    }

    let mut merged: Vec<CharacterCount> = total
        .into_iter()
        .map(|(name, count)| CharacterCount { name, count })
        .collect();
    merged.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    merged.truncate(top_n);
    merged
}

/// Run all three passes and merge them.
pub fn extract_characters(
    text: &str,
    thresholds: &ExtractionThresholds,
    exclusions: &HashSet<String>,
    analyzer: &dyn NounAnalyzer,
) -> Vec<CharacterCount> {
    if text.trim().is_empty() {
        debug!("No text to extract characters from");
        return Vec::new();
    }

    let titles = title_pass(text, thresholds.title_min_count);
    let speakers = speaker_pass(text, thresholds.speaker_min_count, thresholds.min_name_len);
    let nouns = match noun_pass(
        text,
        analyzer,
        thresholds.noun_min_count,
        thresholds.min_name_len,
        exclusions,
    ) {
        Ok(nouns) => nouns,
        Err(e) => {
            warn!("Noun pass failed, continuing without it: {}", e);
            Counts::new()
        }
    };

    debug!(
        "Character passes: {} titled, {} speakers, {} nouns",
        titles.len(),
        speakers.len(),
        nouns.len()
    );
    merge_counts(&[titles, nouns, speakers], thresholds.top_n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::nouns::HangulNounAnalyzer;
    use scriptlens_core::Error;

    struct FailingAnalyzer;

    impl NounAnalyzer for FailingAnalyzer {
        fn nouns(&self, _text: &str) -> Result<Vec<String>> {
            Err(Error::Extraction("analyzer unavailable".to_string()))
        }
    }

    fn counts(pairs: &[(&str, usize)]) -> Counts {
        pairs.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn test_title_pass() {
        let text = "고 반장이 왔다. 최 형사, 고 반장. 고 반장\n".repeat(2);
        let found = title_pass(&text, 3);
        assert_eq!(found.get("고 반장"), Some(&4));
        assert_eq!(found.get("최 형사"), None);
        let found = title_pass(&text, 2);
        assert_eq!(found.get("최 형사"), Some(&2));
    }

    #[test]
    fn test_title_pass_requires_word_boundary() {
        let text = "고 반장 고 반장님 고 반장".to_string();
        let found = title_pass(&text, 1);
        assert_eq!(found.get("고 반장"), Some(&2));
    }

    #[test]
    fn test_speaker_pass_is_line_anchored() {
        let text = "MINA: Go.\nJOON : Wait.\n  MINA: Now.\nthe director says MINA: no\n";
        let found = speaker_pass(text, 1, 2);
        assert_eq!(found.get("MINA"), Some(&2));
        assert_eq!(found.get("JOON"), Some(&1));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_speaker_pass_ignores_mid_line_labels() {
        let text = "1. 사무실 시간: 오후\n고 반장: 어디 갔어?\n형사들이 남긴 메모 장소: 부두, 시간: 새벽\n".repeat(3);
        let found = speaker_pass(&text, 1, 2);
        assert_eq!(found.get("고 반장"), Some(&3));
        assert!(!found.contains_key("시간"));
        assert!(!found.contains_key("장소"));
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_speaker_pass_min_len() {
        let text = "A: hi\nB: hi\nAB: hi\n";
        assert!(!speaker_pass(text, 1, 2).contains_key("A"));
        assert!(speaker_pass(text, 1, 1).contains_key("A"));
    }

    #[test]
    fn test_noun_pass_respects_exclusions() {
        let text = "형사가 사람을 쫓는다 ".repeat(5);
        let exclusions: HashSet<String> = ["사람".to_string()].into_iter().collect();
        let found = noun_pass(&text, &HangulNounAnalyzer::new(), 5, 2, &exclusions).unwrap();
        assert_eq!(found.get("형사"), Some(&5));
        assert!(!found.contains_key("사람"));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = counts(&[("MINA", 30), ("고 반장", 100)]);
        let b = counts(&[("MINA", 5), ("JOON", 30)]);
        let c = counts(&[("형사", 120)]);

        let forward = merge_counts(&[a.clone(), b.clone(), c.clone()], 30);
        let backward = merge_counts(&[c, b, a], 30);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].name, "형사");
        assert_eq!(forward[2], CharacterCount { name: "MINA".into(), count: 35 });
        assert_eq!(forward[3], CharacterCount { name: "JOON".into(), count: 30 });
    }

    #[test]
    fn test_merge_truncates() {
        let pass: Counts = (0..50).map(|i| (format!("P{:02}", i), 50 - i)).collect();
        let merged = merge_counts(&[pass], 30);
        assert_eq!(merged.len(), 30);
        assert_eq!(merged[0].name, "P00");
    }

    #[test]
    fn test_failing_noun_pass_is_skipped() {
        let text = "MINA: Go.\n".repeat(25);
        let found = extract_characters(
            &text,
            &ExtractionThresholds::default(),
            &HashSet::new(),
            &FailingAnalyzer,
        );
        assert_eq!(found, vec![CharacterCount { name: "MINA".into(), count: 25 }]);
    }

    #[test]
    fn test_empty_text() {
        let found = extract_characters(
            "  ",
            &ExtractionThresholds::default(),
            &HashSet::new(),
            &HangulNounAnalyzer::new(),
        );
        assert!(found.is_empty());
    }
}
