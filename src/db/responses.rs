//! Response row operations (append-only)

use rusqlite::{params, Connection, Row};
use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;

/// Response row from database; `answers` is still the encoded JSON blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseRow {
    pub id: String,
    pub survey_id: String,
    pub answers: String,
    pub created_at: String,
}

impl ResponseRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            survey_id: row.get("survey_id")?,
            answers: row.get("answers")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Borrowed insert parameters
#[derive(Debug, Clone, Copy)]
pub struct NewResponseRow<'a> {
    pub id: &'a str,
    pub survey_id: &'a str,
    pub answers: &'a str,
    pub created_at: &'a str,
}

/// Append a response row. A taken id fails with `DuplicateKey`.
pub fn insert_response(conn: &Connection, row: &NewResponseRow<'_>) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO responses (id, survey_id, answers, created_at) VALUES (?, ?, ?, ?)",
        params![row.id, row.survey_id, row.answers, row.created_at],
    )
    .map_err(|e| StorageError::from_insert(e, row.id))?;

    debug!(id = %row.id, survey_id = %row.survey_id, "Inserted response row");
    Ok(())
}

/// All responses for a survey, newest first
pub fn list_responses_for_survey(
    conn: &Connection,
    survey_id: &str,
) -> Result<Vec<ResponseRow>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM responses WHERE survey_id = ? ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map(params![survey_id], |row| ResponseRow::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
