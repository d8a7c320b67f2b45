//! Database schema SQL. Creation is idempotent; `DROP_SQL` is only used by an explicit reset.

/// Movie and per-movie record tables.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    movie_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    filename TEXT NOT NULL UNIQUE,
    last_modified REAL,
    file_path TEXT,
    genre TEXT,
    theme TEXT,
    summary TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS characters (
    character_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(movie_id),
    name TEXT NOT NULL,
    count INTEGER DEFAULT 0,
    description TEXT,
    UNIQUE (movie_id, name)
);

CREATE TABLE IF NOT EXISTS scenes (
    scene_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(movie_id),
    scene_number TEXT NOT NULL,
    heading TEXT,
    location TEXT,
    setting TEXT,
    time_of_day TEXT,
    UNIQUE (movie_id, scene_number)
);

CREATE TABLE IF NOT EXISTS relationships (
    relationship_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(movie_id),
    character1_id INTEGER NOT NULL REFERENCES characters(character_id),
    character2_id INTEGER NOT NULL REFERENCES characters(character_id),
    relationship_type TEXT,
    description TEXT,
    UNIQUE (movie_id, character1_id, character2_id),
    CHECK (character1_id < character2_id)
);

CREATE TABLE IF NOT EXISTS sentiment_analysis (
    sentiment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(movie_id),
    scene_id INTEGER REFERENCES scenes(scene_id),
    character_id INTEGER REFERENCES characters(character_id),
    sentiment_score REAL,
    sentiment_label TEXT,
    sentiment_text TEXT
);

CREATE TABLE IF NOT EXISTS plot_analysis (
    plot_id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(movie_id),
    plot_element TEXT,
    plot_description TEXT,
    plot_order INTEGER
);

CREATE TABLE IF NOT EXISTS settings (
    setting_id INTEGER PRIMARY KEY AUTOINCREMENT,
    setting_key TEXT UNIQUE,
    setting_value TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_characters_movie ON characters(movie_id);
CREATE INDEX IF NOT EXISTS idx_scenes_movie ON scenes(movie_id);
CREATE INDEX IF NOT EXISTS idx_relationships_movie ON relationships(movie_id);
CREATE INDEX IF NOT EXISTS idx_sentiment_movie ON sentiment_analysis(movie_id);
CREATE INDEX IF NOT EXISTS idx_plot_movie ON plot_analysis(movie_id);
"#;

/// Drops every table, children first.
pub const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS sentiment_analysis;
DROP TABLE IF EXISTS plot_analysis;
DROP TABLE IF EXISTS relationships;
DROP TABLE IF EXISTS characters;
DROP TABLE IF EXISTS scenes;
DROP TABLE IF EXISTS movies;
DROP TABLE IF EXISTS settings;
"#;

/// Child tables removed before their movie, in deletion order.
pub const CHILD_TABLES: &[&str] = &[
    "sentiment_analysis",
    "plot_analysis",
    "relationships",
    "characters",
    "scenes",
];
