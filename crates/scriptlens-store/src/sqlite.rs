//! SQLite record store for movies and their extracted/analysed records.
//!
//! Upserts are keyed by natural keys: (movie, name) for characters, (movie,
//! scene_number) for scenes and the unordered character pair for
//! relationships. Every statement commits on its own; a failure halfway
//! through a batch leaves the earlier rows in place.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::backup::Progress;
use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Row};
use tracing::{debug, info};

use crate::schema::{CHILD_TABLES, DROP_SQL, SCHEMA_SQL};
use crate::types::*;
use scriptlens_core::{Error, Result};

fn db_err(e: rusqlite::Error) -> Error {
    Error::Database(e.to_string())
}

/// SQLite-backed store for scripts and analysis results.
pub struct ScriptStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl ScriptStore {
    /// Open or create the database file, creating the schema if needed.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let stats = store.stats()?;
        info!(
            "ScriptStore initialized: {} movies, {} characters, {} scenes, path={}",
            stats.movie_count,
            stats.character_count,
            stats.scene_count,
            store.db_path.display()
        );

        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(db_err)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(db_err)?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))
    }

    /// Drop every table and recreate an empty schema.
    pub fn reset(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(DROP_SQL).map_err(db_err)?;
        conn.flush_prepared_statement_cache();
        Self::init_schema(&conn)?;
        info!("Database reset: {}", self.db_path.display());
        Ok(())
    }

    /// Copy the database into a timestamped backup under `backup_dir`, then reset it.
    /// Returns the backup path.
    pub fn reset_with_backup(&self, backup_dir: &Path) -> Result<PathBuf> {
        let backup = self.backup_timestamped(backup_dir, "scripts_backup_before_init")?;
        self.reset()?;
        Ok(backup)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Backup and restore
    // ---------------------------------------------------------------

    /// Write a consistent copy of the database to `dest`, replacing any file there.
    pub fn backup(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::Storage(e.to_string()))?;
        }
        let conn = self.conn.lock();
        conn.backup(DatabaseName::Main, dest, None).map_err(db_err)?;
        info!("Database backed up to {}", dest.display());
        Ok(())
    }

    /// Back up to `<backup_dir>/<prefix>_<YYYYmmdd_HHMMSS>.db`. A numeric suffix is
    /// added if that name is already taken.
    pub fn backup_timestamped(&self, backup_dir: &Path, prefix: &str) -> Result<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut dest = backup_dir.join(format!("{}_{}.db", prefix, stamp));
        let mut n = 1;
        while dest.exists() {
            dest = backup_dir.join(format!("{}_{}_{}.db", prefix, stamp, n));
            n += 1;
        }
        self.backup(&dest)?;
        Ok(dest)
    }

    /// Replace the database contents with those of the backup at `src`.
    pub fn restore(&self, src: &Path) -> Result<()> {
        if !src.is_file() {
            return Err(Error::NotFound(src.display().to_string()));
        }
        let mut conn = self.conn.lock();
        conn.restore(DatabaseName::Main, src, None::<fn(Progress)>)
            .map_err(db_err)?;
        conn.flush_prepared_statement_cache();
        Self::init_schema(&conn)?;
        info!("Database restored from {}", src.display());
        Ok(())
    }

    // ---------------------------------------------------------------
    // Movies
    // ---------------------------------------------------------------

    /// Insert a movie. Returns the new movie ID.
    pub fn add_movie(&self, opts: &AddMovieOptions) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO movies (title, filename, last_modified, file_path) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .insert(params![
                opts.title,
                opts.filename,
                opts.last_modified,
                opts.file_path
            ])
            .map_err(db_err)?;
        Ok(id)
    }

    /// Return the ID of the movie with this filename, inserting it if absent.
    pub fn get_or_create_movie(&self, opts: &AddMovieOptions) -> Result<i64> {
        if let Some(movie) = self.find_movie_by_filename(&opts.filename)? {
            return Ok(movie.id);
        }
        let id = self.add_movie(opts)?;
        debug!("Registered movie {} ({})", id, opts.filename);
        Ok(id)
    }

    pub fn get_movie(&self, movie_id: i64) -> Result<Option<Movie>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM movies WHERE movie_id = ?1")
            .map_err(db_err)?
            .query_row(params![movie_id], Self::row_to_movie)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    pub fn find_movie_by_filename(&self, filename: &str) -> Result<Option<Movie>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM movies WHERE filename = ?1")
            .map_err(db_err)?
            .query_row(params![filename], Self::row_to_movie)
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Whether `mtime` is newer than the stored modification time.
    /// Unknown files (and files without a stored time) count as modified.
    pub fn is_file_modified(&self, filename: &str, mtime: f64) -> Result<bool> {
        let conn = self.conn.lock();
        let stored: Option<Option<f64>> = conn
            .prepare_cached("SELECT last_modified FROM movies WHERE filename = ?1")
            .map_err(db_err)?
            .query_row(params![filename], |row| row.get(0))
            .optional()
            .map_err(db_err)?;
        Ok(match stored.flatten() {
            Some(previous) => mtime > previous,
            None => true,
        })
    }

    pub fn update_movie_modified_time(&self, movie_id: i64, mtime: f64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE movies SET last_modified = ?1 WHERE movie_id = ?2",
            params![mtime, movie_id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Store the analysis summary, genre and theme line. A non-empty `title` replaces the
    /// filename-derived title.
    pub fn update_movie_summary(
        &self,
        movie_id: i64,
        summary: &str,
        genre: &str,
        theme: &str,
        title: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE movies SET summary = ?1, genre = ?2, theme = ?3 WHERE movie_id = ?4",
                params![summary, genre, theme, movie_id],
            )
            .map_err(db_err)?;
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            conn.execute(
                "UPDATE movies SET title = ?1 WHERE movie_id = ?2",
                params![title, movie_id],
            )
            .map_err(db_err)?;
        }
        Ok(count > 0)
    }

    /// All movies, most recently modified first.
    pub fn list_movies(&self) -> Result<Vec<MovieListing>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT movie_id, title, filename, last_modified FROM movies \
                 ORDER BY last_modified DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                let last_modified: Option<f64> = row.get(3)?;
                Ok(MovieListing {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    filename: row.get(2)?,
                    modified_date: last_modified.and_then(format_local_time),
                })
            })
            .map_err(db_err)?;
        let listings = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;
        Ok(listings)
    }

    /// Delete a movie and all of its records. Returns false if no such movie exists.
    pub fn delete_movie(&self, movie_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        for table in CHILD_TABLES {
            let sql = format!("DELETE FROM {} WHERE movie_id = ?1", table);
            conn.execute(&sql, params![movie_id]).map_err(db_err)?;
        }
        let count = conn
            .execute("DELETE FROM movies WHERE movie_id = ?1", params![movie_id])
            .map_err(db_err)?;
        if count > 0 {
            info!("Deleted movie {} and its records", movie_id);
        }
        Ok(count > 0)
    }

    /// Delete by filename. Returns false if no movie has this filename.
    pub fn delete_movie_by_filename(&self, filename: &str) -> Result<bool> {
        match self.find_movie_by_filename(filename)? {
            Some(movie) => self.delete_movie(movie.id),
            None => Ok(false),
        }
    }

    // ---------------------------------------------------------------
    // Characters
    // ---------------------------------------------------------------

    /// Insert new characters and update counts that changed. Descriptions are left alone.
    pub fn upsert_characters(
        &self,
        movie_id: i64,
        characters: &[CharacterCount],
    ) -> Result<UpsertReport> {
        let conn = self.conn.lock();
        let mut report = UpsertReport::default();

        for character in characters {
            let count = character.count as i64;
            let existing: Option<(i64, i64)> = conn
                .prepare_cached(
                    "SELECT character_id, count FROM characters WHERE movie_id = ?1 AND name = ?2",
                )
                .map_err(db_err)?
                .query_row(params![movie_id, character.name], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()
                .map_err(db_err)?;

            match existing {
                Some((_, stored)) if stored == count => report.unchanged += 1,
                Some((character_id, _)) => {
                    conn.execute(
                        "UPDATE characters SET count = ?1 WHERE character_id = ?2",
                        params![count, character_id],
                    )
                    .map_err(db_err)?;
                    report.updated += 1;
                }
                None => {
                    conn.execute(
                        "INSERT INTO characters (movie_id, name, count) VALUES (?1, ?2, ?3)",
                        params![movie_id, character.name, count],
                    )
                    .map_err(db_err)?;
                    report.inserted += 1;
                }
            }
        }

        Ok(report)
    }

    /// Characters of a movie, most frequent first.
    pub fn get_characters(&self, movie_id: i64) -> Result<Vec<Character>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM characters WHERE movie_id = ?1 ORDER BY count DESC, name ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![movie_id], Self::row_to_character)
            .map_err(db_err)?;
        let characters = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;
        Ok(characters)
    }

    /// Lower-cased character name → character ID, for resolving names found in free text.
    pub fn character_ids_by_name(&self, movie_id: i64) -> Result<HashMap<String, i64>> {
        Ok(self
            .get_characters(movie_id)?
            .into_iter()
            .map(|c| (c.name.to_lowercase(), c.id))
            .collect())
    }

    // ---------------------------------------------------------------
    // Scenes
    // ---------------------------------------------------------------

    /// Insert new scenes and rewrite scenes whose fields changed.
    pub fn upsert_scenes(&self, movie_id: i64, scenes: &[SceneRecord]) -> Result<UpsertReport> {
        let conn = self.conn.lock();
        let mut report = UpsertReport::default();

        for scene in scenes {
            let existing: Option<(i64, SceneRecord)> = conn
                .prepare_cached(
                    "SELECT * FROM scenes WHERE movie_id = ?1 AND scene_number = ?2",
                )
                .map_err(db_err)?
                .query_row(params![movie_id, scene.scene_number], |row| {
                    Ok((row.get("scene_id")?, Self::row_to_scene_record(row)?))
                })
                .optional()
                .map_err(db_err)?;

            match existing {
                Some((_, stored)) if stored == *scene => report.unchanged += 1,
                Some((scene_id, _)) => {
                    conn.execute(
                        "UPDATE scenes SET heading = ?1, location = ?2, setting = ?3, \
                         time_of_day = ?4 WHERE scene_id = ?5",
                        params![
                            scene.heading,
                            scene.location,
                            scene.setting.as_str(),
                            scene.time_of_day,
                            scene_id
                        ],
                    )
                    .map_err(db_err)?;
                    report.updated += 1;
                }
                None => {
                    conn.execute(
                        "INSERT INTO scenes (movie_id, scene_number, heading, location, setting, \
                         time_of_day) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            movie_id,
                            scene.scene_number,
                            scene.heading,
                            scene.location,
                            scene.setting.as_str(),
                            scene.time_of_day
                        ],
                    )
                    .map_err(db_err)?;
                    report.inserted += 1;
                }
            }
        }

        Ok(report)
    }

    /// Scenes of a movie in scene-number order (numeric where possible).
    pub fn get_scenes(&self, movie_id: i64) -> Result<Vec<Scene>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM scenes WHERE movie_id = ?1 \
                 ORDER BY CAST(scene_number AS INTEGER), scene_number",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![movie_id], |row| {
                Ok(Scene {
                    id: row.get("scene_id")?,
                    movie_id: row.get("movie_id")?,
                    record: Self::row_to_scene_record(row)?,
                })
            })
            .map_err(db_err)?;
        let scenes = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;
        Ok(scenes)
    }

    // ---------------------------------------------------------------
    // Relationships
    // ---------------------------------------------------------------

    /// Insert or relabel the relationship between two characters, regardless of order.
    /// A character paired with itself is ignored.
    pub fn upsert_relationship(
        &self,
        movie_id: i64,
        character_a: i64,
        character_b: i64,
        relationship_type: &str,
    ) -> Result<bool> {
        if character_a == character_b {
            return Ok(false);
        }
        let (first, second) = if character_a < character_b {
            (character_a, character_b)
        } else {
            (character_b, character_a)
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO relationships (movie_id, character1_id, character2_id, relationship_type) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (movie_id, character1_id, character2_id) \
             DO UPDATE SET relationship_type = excluded.relationship_type",
            params![movie_id, first, second, relationship_type],
        )
        .map_err(db_err)?;
        Ok(true)
    }

    pub fn get_relationships(&self, movie_id: i64) -> Result<Vec<Relationship>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT r.relationship_id, c1.name, c2.name, r.relationship_type \
                 FROM relationships r \
                 JOIN characters c1 ON r.character1_id = c1.character_id \
                 JOIN characters c2 ON r.character2_id = c2.character_id \
                 WHERE r.movie_id = ?1 ORDER BY r.relationship_id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![movie_id], |row| {
                Ok(Relationship {
                    id: row.get(0)?,
                    character1: row.get(1)?,
                    character2: row.get(2)?,
                    relationship_type: row.get(3)?,
                })
            })
            .map_err(db_err)?;
        let relationships = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;
        Ok(relationships)
    }

    // ---------------------------------------------------------------
    // Sentiment and plot
    // ---------------------------------------------------------------

    /// Append a sentiment record. The score is clamped to [-1, 1].
    pub fn add_sentiment(
        &self,
        movie_id: i64,
        score: f64,
        label: &str,
        details: &serde_json::Value,
    ) -> Result<i64> {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let details_json = serde_json::to_string(details)?;

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO sentiment_analysis (movie_id, sentiment_score, sentiment_label, \
                 sentiment_text) VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .insert(params![movie_id, score, label, details_json])
            .map_err(db_err)?;
        Ok(id)
    }

    /// The most recently inserted sentiment record.
    pub fn latest_sentiment(&self, movie_id: i64) -> Result<Option<SentimentRecord>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT sentiment_id, sentiment_score, sentiment_label, sentiment_text \
                 FROM sentiment_analysis WHERE movie_id = ?1 ORDER BY sentiment_id DESC LIMIT 1",
            )
            .map_err(db_err)?
            .query_row(params![movie_id], |row| {
                let details: Option<String> = row.get(3)?;
                Ok(SentimentRecord {
                    id: row.get(0)?,
                    score: row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
                    label: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    details: details
                        .and_then(|s| serde_json::from_str(&s).ok())
                        .unwrap_or(serde_json::Value::Null),
                })
            })
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Replace all plot points and themes of a movie. Returns the number of rows written.
    pub fn replace_plot_elements(
        &self,
        movie_id: i64,
        plot_points: &[String],
        themes: &[String],
    ) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM plot_analysis WHERE movie_id = ?1",
            params![movie_id],
        )
        .map_err(db_err)?;

        let rows = plot_points
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("plot_point_{}", i + 1), p, (i + 1) as i64))
            .chain(
                themes
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (format!("theme_{}", i + 1), t, 100 + i as i64)),
            );

        let mut written = 0;
        for (element, description, order) in rows {
            conn.prepare_cached(
                "INSERT INTO plot_analysis (movie_id, plot_element, plot_description, plot_order) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .execute(params![movie_id, element, description, order])
            .map_err(db_err)?;
            written += 1;
        }
        Ok(written)
    }

    /// Plot points and themes, each in stored order.
    pub fn get_plot_elements(&self, movie_id: i64) -> Result<(Vec<PlotElement>, Vec<PlotElement>)> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT plot_id, plot_element, plot_description, plot_order FROM plot_analysis \
                 WHERE movie_id = ?1 ORDER BY plot_order",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![movie_id], |row| {
                Ok(PlotElement {
                    id: row.get(0)?,
                    element: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    order: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                })
            })
            .map_err(db_err)?;
        let elements = rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?;

        let (plot_points, rest): (Vec<_>, Vec<_>) = elements
            .into_iter()
            .partition(|e| e.element.starts_with("plot_point"));
        let themes = rest
            .into_iter()
            .filter(|e| e.element.starts_with("theme"))
            .collect();
        Ok((plot_points, themes))
    }

    // ---------------------------------------------------------------
    // Aggregate views
    // ---------------------------------------------------------------

    /// Everything stored for one movie.
    pub fn movie_detail(&self, movie_id: i64) -> Result<Option<MovieDetail>> {
        let movie = match self.get_movie(movie_id)? {
            Some(m) => m,
            None => return Ok(None),
        };
        let (plot_points, themes) = self.get_plot_elements(movie_id)?;
        Ok(Some(MovieDetail {
            characters: self.get_characters(movie_id)?,
            scenes: self.get_scenes(movie_id)?,
            sentiment: self.latest_sentiment(movie_id)?,
            relationships: self.get_relationships(movie_id)?,
            plot_points,
            themes,
            movie,
        }))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |row| row.get(0)).map_err(db_err)
        };
        let movie_count = count("SELECT COUNT(*) FROM movies")?;
        let character_count = count("SELECT COUNT(*) FROM characters")?;
        let scene_count = count("SELECT COUNT(*) FROM scenes")?;

        let top = |table: &str, id_col: &str| -> Result<Option<(String, i64)>> {
            let sql = format!(
                "SELECT m.title, COUNT(x.{id}) AS n FROM movies m \
                 JOIN {table} x ON m.movie_id = x.movie_id \
                 GROUP BY m.movie_id ORDER BY n DESC LIMIT 1",
                id = id_col,
                table = table
            );
            conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()
                .map_err(db_err)
        };
        let most_characters = top("characters", "character_id")?;
        let most_scenes = top("scenes", "scene_id")?;

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            movie_count,
            character_count,
            scene_count,
            most_characters,
            most_scenes,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_movie(row: &Row<'_>) -> rusqlite::Result<Movie> {
        Ok(Movie {
            id: row.get("movie_id")?,
            title: row.get("title")?,
            filename: row.get("filename")?,
            file_path: row.get("file_path")?,
            last_modified: row.get("last_modified")?,
            genre: row.get("genre")?,
            theme: row.get("theme")?,
            summary: row.get("summary")?,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_character(row: &Row<'_>) -> rusqlite::Result<Character> {
        Ok(Character {
            id: row.get("character_id")?,
            movie_id: row.get("movie_id")?,
            name: row.get("name")?,
            count: row.get::<_, Option<i64>>("count")?.unwrap_or(0),
            description: row.get("description")?,
        })
    }

    fn row_to_scene_record(row: &Row<'_>) -> rusqlite::Result<SceneRecord> {
        let setting: Option<String> = row.get("setting")?;
        Ok(SceneRecord {
            scene_number: row.get("scene_number")?,
            heading: row.get::<_, Option<String>>("heading")?.unwrap_or_default(),
            location: row.get::<_, Option<String>>("location")?.unwrap_or_default(),
            setting: setting
                .as_deref()
                .map(Setting::from_stored)
                .unwrap_or(Setting::Interior),
            time_of_day: row
                .get::<_, Option<String>>("time_of_day")?
                .unwrap_or_else(|| UNKNOWN_TIME_OF_DAY.to_string()),
        })
    }
}

/// Render unix seconds as local `YYYY-MM-DD HH:MM:SS`.
fn format_local_time(secs: f64) -> Option<String> {
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    chrono::DateTime::from_timestamp(whole, nanos).map(|utc| {
        utc.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}
