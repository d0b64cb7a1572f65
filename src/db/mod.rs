//! SQLite database module for surveys and responses
//!
//! ## Tables
//!
//! - `surveys` - Survey definitions (questions stored as a JSON blob)
//! - `responses` - Append-only submissions (answers stored as a JSON blob)
//!
//! The JSON blobs are opaque here; rows are decoded by [`crate::model`].

pub mod responses;
pub mod schema;
pub mod surveys;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StorageError;

/// SQLite database for surveys and responses
pub struct SurveyDb {
    conn: Mutex<Connection>,
}

impl SurveyDb {
    /// Open or create the survey database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        info!("Opening SQLite database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // WAL for concurrent readers while a response is being appended
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        debug!("Opening in-memory SQLite database");

        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.with_conn(schema::init_schema)
    }

    /// Run `f` with exclusive access to the connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let conn = self.conn.lock()
            .map_err(|e| StorageError::Internal(format!("Lock poisoned: {}", e)))?;
        f(&conn)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, StorageError> {
        self.with_conn(|conn| {
            let survey_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM surveys", [], |row| row.get(0))?;

            let response_count: i64 = conn
                .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;

            Ok(DbStats {
                survey_count: survey_count as u64,
                response_count: response_count as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub survey_count: u64,
    pub response_count: u64,
}

// Re-exports
pub use responses::{NewResponseRow, ResponseRow};
pub use surveys::{NewSurveyRow, SurveyRow};
