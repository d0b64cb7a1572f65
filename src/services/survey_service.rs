//! Survey service - create, fetch and list survey definitions
//!
//! Surveys are written once and never updated. Question lists cross the
//! storage boundary only through the codec in [`crate::model`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{surveys, NewSurveyRow, SurveyDb, SurveyRow};
use crate::error::StorageError;
use crate::model::{self, CreateSurveyInput, Survey};

use super::events::{EventBus, StorageEvent};
use super::now_timestamp;

pub struct SurveyService {
    db: Arc<SurveyDb>,
    events: Arc<EventBus>,
}

impl SurveyService {
    pub fn new(db: Arc<SurveyDb>, events: Arc<EventBus>) -> Self {
        Self { db, events }
    }

    /// Validate and persist a new survey, returning the stored record
    pub fn create(&self, input: CreateSurveyInput) -> Result<Survey, StorageError> {
        let (id, title, questions) = match (input.id, input.title, input.questions) {
            (Some(id), Some(title), Some(questions)) if !id.is_empty() && !title.is_empty() => {
                (id, title, questions)
            }
            _ => return Err(StorageError::Validation("Missing required fields".into())),
        };
        model::validate_questions(&questions)?;

        let encoded = model::encode_questions(&questions)?;
        let created_at = now_timestamp();

        self.db.with_conn(|conn| {
            surveys::insert_survey(conn, &NewSurveyRow {
                id: &id,
                title: &title,
                description: input.description.as_deref(),
                questions: &encoded,
                created_at: &created_at,
            })
        })?;

        info!(id = %id, questions = questions.len(), "Survey created");
        self.events.emit(StorageEvent::SurveyCreated {
            id: id.clone(),
            title: title.clone(),
            question_count: questions.len(),
        });

        Ok(Survey {
            id,
            title,
            description: input.description,
            questions,
            created_at,
        })
    }

    /// Fetch a survey by id; `NotFound` if absent
    pub fn get(&self, id: &str) -> Result<Survey, StorageError> {
        let row = self
            .db
            .with_conn(|conn| surveys::get_survey(conn, id))?
            .ok_or_else(|| StorageError::NotFound("Survey".into()))?;
        decode_row(row)
    }

    /// All surveys, newest first. Rows whose questions fail to decode are
    /// logged and left out of the list.
    pub fn list_all(&self) -> Result<Vec<Survey>, StorageError> {
        let rows = self.db.with_conn(surveys::list_surveys)?;
        Ok(rows.into_iter().filter_map(|row| decode_row(row).ok()).collect())
    }
}

fn decode_row(row: SurveyRow) -> Result<Survey, StorageError> {
    let questions = model::decode_questions(&row.questions).inspect_err(|e| {
        warn!(id = %row.id, error = %e, "Stored survey has undecodable questions");
    })?;

    Ok(Survey {
        id: row.id,
        title: row.title,
        description: row.description,
        questions,
        created_at: row.created_at,
    })
}
