use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

use super::data::{compare_names, Coordinate, PhotoRecord};
use super::error::StoreResult;

/// The Library manages the SQLite photo catalogue.
/// It stores photo metadata, with the image bytes kept in a separate blob table.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

const SELECT_PHOTO: &str = "SELECT p.id, p.name, p.date_added, p.latitude, p.longitude, p.city, b.data
     FROM photos p JOIN photo_blobs b ON b.photo_id = p.id";

impl Library {
    /// Create a new Library instance at the default location.
    ///
    /// The database file is created in the user's data directory:
    /// - Linux: ~/.local/share/namesnap/namesnap.db
    /// - macOS: ~/Library/Application Support/namesnap/namesnap.db
    /// - Windows: %APPDATA%\namesnap\namesnap.db
    pub fn new() -> StoreResult<Self> {
        Self::open(Self::default_db_path())
    }

    /// Open or create the catalogue at `db_path`
    pub fn open(db_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let db_path = db_path.into();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        info!("📁 Database initialized at: {}", db_path.display());

        Self::with_connection(conn, db_path)
    }

    /// In-memory catalogue, gone when dropped
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, db_path: PathBuf) -> StoreResult<Self> {
        let mut library = Library { conn, db_path };
        library.init_schema()?;
        Ok(library)
    }

    /// Make every subsequent insert fail
    #[cfg(test)]
    pub(crate) fn drop_blob_table(&self) {
        self.conn
            .execute_batch("DROP TABLE photo_blobs")
            .expect("drop photo_blobs");
    }

    /// Get the path where the database should be stored
    pub fn default_db_path() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        path.push("namesnap");
        path.push("namesnap.db");
        path
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS photos (
                id              TEXT PRIMARY KEY NOT NULL,
                name            TEXT NOT NULL,
                date_added      INTEGER NOT NULL
            )",
            [],
        )?;

        // Image bytes live out of line so listing metadata stays cheap
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS photo_blobs (
                photo_id        TEXT PRIMARY KEY NOT NULL,
                data            BLOB NOT NULL,
                FOREIGN KEY(photo_id) REFERENCES photos(id) ON DELETE CASCADE
            )",
            [],
        )?;

        // Location columns arrived after the first release.
        // If the column already exists the ALTER fails and is ignored.
        let _ = self.conn.execute("ALTER TABLE photos ADD COLUMN latitude REAL", []);
        let _ = self.conn.execute("ALTER TABLE photos ADD COLUMN longitude REAL", []);
        let _ = self.conn.execute("ALTER TABLE photos ADD COLUMN city TEXT", []);

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photos_name
             ON photos(name COLLATE NOCASE)",
            [],
        )?;

        debug!("✅ Database schema initialized");

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Get a count of photos in the library
    pub fn photo_count(&self) -> StoreResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a new record together with its image bytes in one commit
    pub fn insert_photo(&self, record: &PhotoRecord) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let id = record.id.to_string();

        tx.execute(
            "INSERT INTO photos (id, name, date_added, latitude, longitude, city)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &id,
                &record.name,
                record.date_added.timestamp_millis(),
                record.location.map(|c| c.latitude),
                record.location.map(|c| c.longitude),
                &record.city,
            ],
        )?;
        tx.execute(
            "INSERT INTO photo_blobs (photo_id, data) VALUES (?1, ?2)",
            params![&id, &record.photo],
        )?;
        tx.commit()?;

        info!("📸 Saved photo \"{}\" ({} bytes)", record.name, record.photo.len());
        Ok(())
    }

    /// Look up a single record
    pub fn get_photo(&self, id: Uuid) -> StoreResult<Option<PhotoRecord>> {
        let sql = format!("{} WHERE p.id = ?1", SELECT_PHOTO);
        let record = self
            .conn
            .query_row(&sql, [id.to_string()], photo_from_row)
            .optional()?;
        Ok(record)
    }

    /// Get all photos ordered by name (locale-aware, ascending)
    pub fn get_all_photos(&self) -> StoreResult<Vec<PhotoRecord>> {
        let sql = format!("{} ORDER BY p.name COLLATE NOCASE", SELECT_PHOTO);
        let mut stmt = self.conn.prepare(&sql)?;

        let photo_iter = stmt.query_map([], photo_from_row)?;

        let mut photos = Vec::new();
        for photo in photo_iter {
            photos.push(photo?);
        }

        // SQLite's NOCASE only folds ASCII
        photos.sort_by(|a, b| compare_names(&a.name, &b.name));

        Ok(photos)
    }

    /// Replace a record's name and, optionally, its image bytes.
    /// Returns false if the record no longer exists.
    pub fn update_photo(&self, id: Uuid, name: &str, photo: Option<&[u8]>) -> StoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let id = id.to_string();

        let changed = tx.execute(
            "UPDATE photos SET name = ?1 WHERE id = ?2",
            params![name, &id],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        if let Some(bytes) = photo {
            tx.execute(
                "UPDATE photo_blobs SET data = ?1 WHERE photo_id = ?2",
                params![bytes, &id],
            )?;
        }
        tx.commit()?;

        Ok(true)
    }

    /// Attach a reverse-geocoded locality to an existing record
    pub fn set_city(&self, id: Uuid, city: Option<&str>) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE photos SET city = ?1 WHERE id = ?2",
            params![city, id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Remove a record and its bytes.
    /// Returns false (and changes nothing) if it was already gone.
    pub fn delete_photo(&self, id: Uuid) -> StoreResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let id = id.to_string();

        tx.execute("DELETE FROM photo_blobs WHERE photo_id = ?1", [&id])?;
        let removed = tx.execute("DELETE FROM photos WHERE id = ?1", [&id])?;
        tx.commit()?;

        Ok(removed > 0)
    }
}

fn photo_from_row(row: &Row<'_>) -> rusqlite::Result<PhotoRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let millis: i64 = row.get(2)?;
    let date_added = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            format!("date_added {} is out of range", millis).into(),
        )
    })?;

    let latitude: Option<f64> = row.get(3)?;
    let longitude: Option<f64> = row.get(4)?;
    let location = match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };

    Ok(PhotoRecord {
        id,
        name: row.get(1)?,
        date_added,
        location,
        city: row.get(5)?,
        photo: row.get(6)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
