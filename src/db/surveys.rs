//! Survey row operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;

/// Survey row from database; `questions` is still the encoded JSON blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: String,
    pub created_at: String,
}

impl SurveyRow {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            questions: row.get("questions")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Borrowed insert parameters
#[derive(Debug, Clone, Copy)]
pub struct NewSurveyRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub questions: &'a str,
    pub created_at: &'a str,
}

/// Insert a survey row. A taken id fails with `DuplicateKey`.
pub fn insert_survey(conn: &Connection, row: &NewSurveyRow<'_>) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO surveys (id, title, description, questions, created_at) VALUES (?, ?, ?, ?, ?)",
        params![row.id, row.title, row.description, row.questions, row.created_at],
    )
    .map_err(|e| StorageError::from_insert(e, row.id))?;

    debug!(id = %row.id, "Inserted survey row");
    Ok(())
}

/// Get survey by ID
pub fn get_survey(conn: &Connection, id: &str) -> Result<Option<SurveyRow>, StorageError> {
    let row = conn
        .query_row("SELECT * FROM surveys WHERE id = ?", params![id], |row| {
            SurveyRow::from_row(row)
        })
        .optional()?;

    Ok(row)
}

/// List all surveys, newest first
pub fn list_surveys(conn: &Connection) -> Result<Vec<SurveyRow>, StorageError> {
    let mut stmt = conn.prepare("SELECT * FROM surveys ORDER BY created_at DESC, rowid DESC")?;

    let rows = stmt
        .query_map([], |row| SurveyRow::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Check whether a survey exists
pub fn survey_exists(conn: &Connection, id: &str) -> Result<bool, StorageError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM surveys WHERE id = ?", params![id], |row| row.get(0))
        .optional()?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::init_schema;

    fn setup_test_db() -> Connection {
        let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
        init_schema(&conn).expect("Failed to create schema");
        conn
    }

    fn row<'a>(id: &'a str, created_at: &'a str) -> NewSurveyRow<'a> {
        NewSurveyRow {
            id,
            title: "Team survey",
            description: Some("Quarterly check-in"),
            questions: "[]",
            created_at,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup_test_db();
        insert_survey(&conn, &row("s1", "2026-03-01T10:00:00.000Z")).unwrap();

        let found = get_survey(&conn, "s1").unwrap().expect("survey should exist");
        assert_eq!(found.title, "Team survey");
        assert_eq!(found.description.as_deref(), Some("Quarterly check-in"));
        assert_eq!(found.questions, "[]");
        assert_eq!(found.created_at, "2026-03-01T10:00:00.000Z");

        assert!(get_survey(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id() {
        let conn = setup_test_db();
        insert_survey(&conn, &row("s1", "2026-03-01T10:00:00.000Z")).unwrap();

        let err = insert_survey(&conn, &row("s1", "2026-03-02T10:00:00.000Z")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(id) if id == "s1"));
    }

    #[test]
    fn test_list_newest_first() {
        let conn = setup_test_db();
        insert_survey(&conn, &row("old", "2026-01-01T00:00:00.000Z")).unwrap();
        insert_survey(&conn, &row("new", "2026-03-01T00:00:00.000Z")).unwrap();
        insert_survey(&conn, &row("mid", "2026-02-01T00:00:00.000Z")).unwrap();

        let ids: Vec<String> = list_surveys(&conn).unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_list_ties_break_by_insertion() {
        let conn = setup_test_db();
        insert_survey(&conn, &row("first", "2026-01-01T00:00:00.000Z")).unwrap();
        insert_survey(&conn, &row("second", "2026-01-01T00:00:00.000Z")).unwrap();

        let ids: Vec<String> = list_surveys(&conn).unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }

    #[test]
    fn test_list_empty() {
        let conn = setup_test_db();
        assert!(list_surveys(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_survey_exists() {
        let conn = setup_test_db();
        assert!(!survey_exists(&conn, "s1").unwrap());
        insert_survey(&conn, &row("s1", "2026-03-01T10:00:00.000Z")).unwrap();
        assert!(survey_exists(&conn, "s1").unwrap());
    }
}
