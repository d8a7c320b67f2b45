//! Scene heading detection.
//!
//! Scripts number their scenes in different ways, so three heading patterns
//! are tried in order and the first one that finds enough headings wins:
//!
//! 1. `12. 강남 경찰서 - 낮`
//! 2. `S#12. 강남 경찰서` or `#12 ...`
//! 3. `INT. OFFICE - DAY` / `내부 ...` (numbered 1..n in order of appearance)
//!
//! A heading only counts at the start of the text or right after a newline.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use scriptlens_core::ExtractionThresholds;
use scriptlens_store::{SceneRecord, Setting, UNKNOWN_TIME_OF_DAY};

static NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\A|\n)(\d+)\.\s*([^\n]+)").unwrap());

static HASH_NUMBERED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\A|\n)[#S]+\s*(\d+)\s*\.*\s*([^\n]+)").unwrap());

static INT_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\A|\n)(?:INT|EXT|내부|외부)\.*\s*([^\n]+)").unwrap());

static TIME_OF_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(밤|낮|새벽|저녁|아침|오전|오후|DAY|NIGHT|MORNING|EVENING)\b").unwrap()
});

const EXTERIOR_MARKERS: &[&str] = &["외부", "EXT", "EXTERNAL", "야외"];

/// A detected heading before classification.
struct HeadingMatch {
    start: usize,
    number: String,
    location: String,
    /// The whole heading line, prefix included.
    line: String,
}

fn numbered_headings(re: &Regex, text: &str) -> Vec<HeadingMatch> {
    re.captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(HeadingMatch {
                start: whole.start(),
                number: cap[1].to_string(),
                location: cap[2].trim().to_string(),
                line: whole.as_str().trim().to_string(),
            })
        })
        .collect()
}

fn int_ext_headings(text: &str) -> Vec<HeadingMatch> {
    INT_EXT
        .captures_iter(text)
        .enumerate()
        .filter_map(|(i, cap)| {
            let whole = cap.get(0)?;
            Some(HeadingMatch {
                start: whole.start(),
                number: (i + 1).to_string(),
                location: cap[1].trim().to_string(),
                line: whole.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Interior/exterior flag of a heading.
pub fn classify_setting(heading: &str) -> Setting {
    let upper = heading.to_uppercase();
    if EXTERIOR_MARKERS.iter().any(|m| upper.contains(m)) {
        Setting::Exterior
    } else {
        Setting::Interior
    }
}

/// First time-of-day word in a heading, as written, or `unknown`.
pub fn time_of_day(location: &str) -> String {
    TIME_OF_DAY
        .captures(location)
        .map(|cap| cap[1].to_string())
        .unwrap_or_else(|| UNKNOWN_TIME_OF_DAY.to_string())
}

/// Detect scenes, falling through the heading patterns while too few headings are found.
pub fn extract_scenes(text: &str, thresholds: &ExtractionThresholds) -> Vec<SceneRecord> {
    let mut headings = numbered_headings(&NUMBERED, text);
    if thresholds.fallback_warranted(headings.len()) {
        debug!("{} numbered headings, trying S# headings", headings.len());
        headings = numbered_headings(&HASH_NUMBERED, text);
    }
    if thresholds.fallback_warranted(headings.len()) {
        debug!("{} S# headings, trying INT/EXT headings", headings.len());
        headings = int_ext_headings(text);
    }

    let mut scenes = Vec::with_capacity(headings.len());
    for (i, h) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map(|n| n.start).unwrap_or(text.len());
        if text[h.start..end].trim().is_empty() {
            continue;
        }
        scenes.push(SceneRecord {
            heading: format!("{}. {}", h.number, h.location),
            setting: classify_setting(&h.line),
            time_of_day: time_of_day(&h.location),
            location: h.location.clone(),
            scene_number: h.number.clone(),
        });
    }
    scenes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ExtractionThresholds {
        ExtractionThresholds::default()
    }

    #[test]
    fn test_primary_pattern_used_when_enough() {
        let text: String = (1..=12)
            .map(|n| format!("\n{}. 강남 경찰서 - 낮\n고 반장: 가자.\n", n))
            .collect();
        let scenes = extract_scenes(&text, &thresholds());
        assert_eq!(scenes.len(), 12);
        assert_eq!(scenes[0].scene_number, "1");
        assert_eq!(scenes[0].heading, "1. 강남 경찰서 - 낮");
        assert_eq!(scenes[0].time_of_day, "낮");
        assert_eq!(scenes[11].scene_number, "12");
    }

    #[test]
    fn test_falls_back_to_secondary() {
        let mut text = String::new();
        for n in 1..=5 {
            text.push_str(&format!("\n{}. a numbered aside\n", n));
        }
        for n in 1..=15 {
            text.push_str(&format!("\nS#{}. 옥상 - 밤\n대사\n", n));
        }
        let scenes = extract_scenes(&text, &thresholds());
        assert_eq!(scenes.len(), 15);
        assert_eq!(scenes[14].scene_number, "15");
        assert_eq!(scenes[0].location, "옥상 - 밤");
        assert_eq!(scenes[0].time_of_day, "밤");
    }

    #[test]
    fn test_int_ext_numbering_and_setting() {
        let text = "\nINT. OFFICE - NIGHT\nMINA: Go.\nEXT. ROOF - day\nJOON: Now.\n";
        let scenes = extract_scenes(text, &thresholds());
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].scene_number, "1");
        assert_eq!(scenes[0].setting, Setting::Interior);
        assert_eq!(scenes[0].time_of_day, "NIGHT");
        assert_eq!(scenes[1].scene_number, "2");
        assert_eq!(scenes[1].location, "ROOF - day");
        assert_eq!(scenes[1].setting, Setting::Exterior);
        assert_eq!(scenes[1].time_of_day, "day");
    }

    #[test]
    fn test_heading_at_start_of_text() {
        let text = "1. INT. OFFICE - DAY\nA: Hello.\nB: Hi.";
        let t = ExtractionThresholds {
            scene_fallback_min: 1,
            ..ExtractionThresholds::default()
        };
        let scenes = extract_scenes(text, &t);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].location, "INT. OFFICE - DAY");
        assert_eq!(scenes[0].setting, Setting::Interior);
    }

    #[test]
    fn test_setting_and_time_helpers() {
        assert_eq!(classify_setting("3. 외부 - 공원"), Setting::Exterior);
        assert_eq!(classify_setting("3. 야외 촬영장"), Setting::Exterior);
        assert_eq!(classify_setting("3. 사무실"), Setting::Interior);
        assert_eq!(time_of_day("사무실"), UNKNOWN_TIME_OF_DAY);
        assert_eq!(time_of_day("거리 - 새벽"), "새벽");
    }

    #[test]
    fn test_no_headings() {
        assert!(extract_scenes("just prose, no headings", &thresholds()).is_empty());
    }
}
