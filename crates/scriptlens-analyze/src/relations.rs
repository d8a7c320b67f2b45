//! Relationship mentions in character-analysis text.
//!
//! The analysis prompt asks for lines such as `민수와 지영의 관계: 연인`; the
//! patterns below also accept a few looser shapes seen in replies. Names are
//! matched case-insensitively against the movie's stored characters and
//! anything that does not resolve is dropped.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use scriptlens_core::Result;
use scriptlens_ingest::extract::characters::TITLES;
use scriptlens_store::ScriptStore;

/// "A와 B" with either particle, or the literal "와(과)" form.
const AND: &str = r"(?:와\(과\)|와|과)";
/// Label text up to the next comma, period or line end.
const LABEL: &str = r"([^,\.\n]+)";

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    // A titled name such as "고 반장", else a single word.
    let name = format!(r"(\b[가-힣]{{1,2}}[ \t](?:{})|\w+)", TITLES.join("|"));
    [
        format!(r"{name}{AND}\s*{name}의\s*관계[:：]?\s*{LABEL}"),
        format!(r"{name}{AND}\s*{name}[:：]\s*{LABEL}"),
        format!(r"{name}{AND}\s*{name}\s*사이[:：]?\s*{LABEL}"),
        format!(r"{name}{AND}\s*{name}\s*-\s*{LABEL}"),
        format!(r"{name}[:：]\s*{name}의\s*{LABEL}"),
        format!(r"(?i)(\w+)\s+and\s+(\w+)\s*[:：]\s*{LABEL}"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// A relationship mention as written in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMention {
    pub first: String,
    pub second: String,
    pub label: String,
}

/// Find relationship mentions, pattern by pattern in the order above.
pub fn detect_relations(text: &str) -> Vec<RelationMention> {
    let mut found = Vec::new();
    for re in PATTERNS.iter() {
        for cap in re.captures_iter(text) {
            let label = cap[3].trim();
            if label.is_empty() {
                continue;
            }
            found.push(RelationMention {
                first: normalize_name(&cap[1]),
                second: normalize_name(&cap[2]),
                label: label.to_string(),
            });
        }
    }
    found
}

/// Single spaces between name parts, matching how titled names are stored.
fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep mentions whose names both resolve in `ids` (lower-cased name → character ID).
pub fn resolve_relations(
    mentions: &[RelationMention],
    ids: &HashMap<String, i64>,
) -> Vec<(i64, i64, String)> {
    mentions
        .iter()
        .filter_map(|m| {
            let a = ids.get(&m.first.to_lowercase())?;
            let b = ids.get(&m.second.to_lowercase())?;
            (a != b).then(|| (*a, *b, m.label.clone()))
        })
        .collect()
}

/// Detect relationships in `analysis` and upsert them for `movie_id`.
/// Returns the number of resolved mentions written.
pub fn save_relationships(store: &ScriptStore, movie_id: i64, analysis: &str) -> Result<usize> {
    let ids = store.character_ids_by_name(movie_id)?;
    let mentions = detect_relations(analysis);
    let resolved = resolve_relations(&mentions, &ids);
    debug!(
        "Relationships: {} mentions, {} resolved for movie {}",
        mentions.len(),
        resolved.len(),
        movie_id
    );

    for (a, b, label) in &resolved {
        store.upsert_relationship(movie_id, *a, *b, label)?;
    }
    Ok(resolved.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptlens_store::{AddMovieOptions, CharacterCount};
    use tempfile::TempDir;

    fn store_with_cast(names: &[&str]) -> (ScriptStore, i64, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ScriptStore::open(dir.path().join("scripts.db")).unwrap();
        let movie_id = store
            .add_movie(&AddMovieOptions {
                title: "heist".into(),
                filename: "heist.pdf".into(),
                ..Default::default()
            })
            .unwrap();
        let cast: Vec<CharacterCount> = names
            .iter()
            .map(|n| CharacterCount {
                name: n.to_string(),
                count: 30,
            })
            .collect();
        store.upsert_characters(movie_id, &cast).unwrap();
        (store, movie_id, dir)
    }

    #[test]
    fn test_detects_korean_shapes() {
        let text = "민수와 지영의 관계: 연인\n철수과 영희 사이: 오래된 친구\n민수: 철수의 형";
        let found = detect_relations(text);
        assert!(found.contains(&RelationMention {
            first: "민수".into(),
            second: "지영".into(),
            label: "연인".into(),
        }));
        assert!(found.contains(&RelationMention {
            first: "철수".into(),
            second: "영희".into(),
            label: "오래된 친구".into(),
        }));
        assert!(found.contains(&RelationMention {
            first: "민수".into(),
            second: "철수".into(),
            label: "형".into(),
        }));
    }

    #[test]
    fn test_literal_particle_form() {
        let found = detect_relations("민수와(과) 지영 - 동료");
        assert_eq!(found[0].first, "민수");
        assert_eq!(found[0].second, "지영");
        assert_eq!(found[0].label, "동료");
    }

    #[test]
    fn test_titled_names() {
        let found = detect_relations("고 반장과 최 형사의 관계: 상사와 부하\n민수: 박 부사장의 비서");
        assert_eq!(
            found,
            vec![
                RelationMention {
                    first: "고 반장".into(),
                    second: "최 형사".into(),
                    label: "상사와 부하".into(),
                },
                RelationMention {
                    first: "민수".into(),
                    second: "박 부사장".into(),
                    label: "비서".into(),
                },
            ]
        );
    }

    #[test]
    fn test_titled_pair_is_saved() {
        let (store, movie_id, _dir) = store_with_cast(&["고 반장", "최 형사"]);
        let saved =
            save_relationships(&store, movie_id, "고 반장과 최 형사의 관계: 상사와 부하").unwrap();
        assert_eq!(saved, 1);

        let rels = store.get_relationships(movie_id).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type.as_deref(), Some("상사와 부하"));
    }

    #[test]
    fn test_unresolved_names_are_dropped() {
        let ids: HashMap<String, i64> = [("mina".to_string(), 1), ("joon".to_string(), 2)]
            .into_iter()
            .collect();
        let mentions = detect_relations("Mina and Joon: partners.\nMina and Kim: strangers.");
        let resolved = resolve_relations(&mentions, &ids);
        assert_eq!(resolved, vec![(1, 2, "partners".to_string())]);
    }

    #[test]
    fn test_reversed_pair_is_one_relationship() {
        let (store, movie_id, _dir) = store_with_cast(&["MINA", "JOON"]);
        let saved = save_relationships(
            &store,
            movie_id,
            "MINA and JOON: partners\nJOON and MINA: rivals\n",
        )
        .unwrap();
        assert_eq!(saved, 2);

        let rels = store.get_relationships(movie_id).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type.as_deref(), Some("rivals"));
    }
}
