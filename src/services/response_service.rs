//! Response service - append-only submissions
//!
//! By default a response may reference a survey id that does not exist; set
//! `require_existing_survey` to check the reference before inserting.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{responses, surveys, NewResponseRow, ResponseRow, SurveyDb};
use crate::error::StorageError;
use crate::model::{self, AnswerSheet, CreateResponseInput, SurveyResponse};

use super::events::{EventBus, StorageEvent};
use super::now_timestamp;

pub struct ResponseService {
    db: Arc<SurveyDb>,
    events: Arc<EventBus>,
    require_existing_survey: bool,
}

impl ResponseService {
    pub fn new(db: Arc<SurveyDb>, events: Arc<EventBus>) -> Self {
        Self {
            db,
            events,
            require_existing_survey: false,
        }
    }

    /// Reject responses whose survey does not exist
    pub fn with_survey_check(mut self, enabled: bool) -> Self {
        self.require_existing_survey = enabled;
        self
    }

    /// Validate and append a response, returning the stored record
    pub fn create(&self, input: CreateResponseInput) -> Result<SurveyResponse, StorageError> {
        let (id, survey_id, answers) = match (input.id, input.survey_id, input.answers) {
            (Some(id), Some(survey_id), Some(answers))
                if !id.is_empty() && !survey_id.is_empty() =>
            {
                (id, survey_id, answers)
            }
            _ => return Err(StorageError::Validation("Missing required fields".into())),
        };

        let encoded = model::encode_answers(&answers)?;
        let created_at = now_timestamp();
        let require_existing_survey = self.require_existing_survey;

        self.db.with_conn(|conn| {
            if require_existing_survey && !surveys::survey_exists(conn, &survey_id)? {
                return Err(StorageError::NotFound("Survey".into()));
            }
            responses::insert_response(conn, &NewResponseRow {
                id: &id,
                survey_id: &survey_id,
                answers: &encoded,
                created_at: &created_at,
            })
        })?;

        info!(id = %id, survey_id = %survey_id, answers = answers.len(), "Response submitted");
        self.events.emit(StorageEvent::ResponseSubmitted {
            id: id.clone(),
            survey_id: survey_id.clone(),
            answer_count: answers.len(),
        });

        Ok(SurveyResponse {
            id,
            survey_id,
            answers,
            created_at,
        })
    }

    /// All responses for a survey, newest first
    pub fn list_by_survey(&self, survey_id: &str) -> Result<Vec<SurveyResponse>, StorageError> {
        let rows = self
            .db
            .with_conn(|conn| responses::list_responses_for_survey(conn, survey_id))?;
        Ok(rows.into_iter().map(decode_row).collect())
    }
}

/// A row with an undecodable answers blob reads as an empty answer sheet
fn decode_row(row: ResponseRow) -> SurveyResponse {
    let answers = model::decode_answers(&row.answers).unwrap_or_else(|e| {
        warn!(id = %row.id, error = %e, "Dropping undecodable answers");
        AnswerSheet::new()
    });

    SurveyResponse {
        id: row.id,
        survey_id: row.survey_id,
        answers,
        created_at: row.created_at,
    }
}
