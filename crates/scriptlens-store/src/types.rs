//! Data types for movies, characters, scenes and analysis records.

use serde::{Deserialize, Serialize};

/// Sentinel stored when a scene heading names no time of day.
pub const UNKNOWN_TIME_OF_DAY: &str = "unknown";

/// A movie (one ingested script file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// File modification time in unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Row of the movie listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieListing {
    pub id: i64,
    pub title: String,
    pub filename: String,
    /// Local time rendering of `last_modified`, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<String>,
}

/// Options for adding a movie.
#[derive(Debug, Clone, Default)]
pub struct AddMovieOptions {
    pub title: String,
    pub filename: String,
    pub file_path: Option<String>,
    pub last_modified: Option<f64>,
}

/// A candidate character name with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCount {
    pub name: String,
    pub count: usize,
}

/// A stored character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub movie_id: i64,
    pub name: String,
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Interior/exterior flag of a scene heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Setting {
    #[serde(rename = "INT")]
    Interior,
    #[serde(rename = "EXT")]
    Exterior,
}

impl Setting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interior => "INT",
            Self::Exterior => "EXT",
        }
    }

    /// Parse a stored flag. Anything other than `EXT` reads as interior.
    pub fn from_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("EXT") {
            Self::Exterior
        } else {
            Self::Interior
        }
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scene as produced by the scene extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    pub scene_number: String,
    pub heading: String,
    pub location: String,
    pub setting: Setting,
    pub time_of_day: String,
}

/// A stored scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: i64,
    pub movie_id: i64,
    #[serde(flatten)]
    pub record: SceneRecord,
}

/// A stored relationship, with character names resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: i64,
    pub character1: String,
    pub character2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
}

/// A sentiment analysis row. The row with the highest id is current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    pub id: i64,
    pub score: f64,
    pub label: String,
    pub details: serde_json::Value,
}

/// A plot point or theme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotElement {
    pub id: i64,
    pub element: String,
    pub description: String,
    pub order: i64,
}

/// Everything stored for one movie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub characters: Vec<Character>,
    pub scenes: Vec<Scene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentRecord>,
    pub plot_points: Vec<PlotElement>,
    pub themes: Vec<PlotElement>,
    pub relationships: Vec<Relationship>,
}

/// Outcome of a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub movie_count: i64,
    pub character_count: i64,
    pub scene_count: i64,
    /// Title and character count of the movie with the most characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_characters: Option<(String, i64)>,
    /// Title and scene count of the movie with the most scenes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_scenes: Option<(String, i64)>,
    pub db_path: String,
    pub db_size_mb: f64,
}
