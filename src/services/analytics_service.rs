//! Analytics service - dashboard view of a survey's responses
//!
//! Fetches the survey and its responses once, then runs the aggregation
//! engine over every question and attaches display percentages.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::aggregation::{self, QuestionSummary};
use crate::error::StorageError;
use crate::model::QuestionKind;

use super::response_service::ResponseService;
use super::survey_service::SurveyService;

pub struct AnalyticsService {
    surveys: Arc<SurveyService>,
    responses: Arc<ResponseService>,
}

/// Aggregated results for one survey
#[derive(Debug, Clone, Serialize)]
pub struct SurveyAnalytics {
    pub survey_id: String,
    pub title: String,
    pub total_responses: u64,
    pub question_count: usize,
    pub questions: Vec<QuestionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionReport {
    /// 1-based display position
    pub position: usize,
    pub question_id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub summary: ReportSummary,
}

/// A [`QuestionSummary`] with percentages attached
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSummary {
    Text {
        answers: Vec<String>,
    },
    Scale {
        average: f64,
        valid_answers: u64,
        buckets: Vec<Bucket>,
    },
    Choice {
        options: Vec<OptionShare>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub score: u8,
    pub count: u64,
    pub percentage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionShare {
    pub option: String,
    pub count: u64,
    pub percentage: u64,
    pub declared: bool,
}

impl ReportSummary {
    /// Choice percentages are over all responses to the survey; scale
    /// percentages are over the valid scale answers.
    fn from_summary(summary: QuestionSummary, total_responses: u64) -> Self {
        match summary {
            QuestionSummary::Text { answers } => ReportSummary::Text { answers },
            QuestionSummary::Scale(scale) => ReportSummary::Scale {
                average: scale.average,
                valid_answers: scale.valid_answers,
                buckets: scale
                    .counts
                    .into_iter()
                    .map(|(score, count)| Bucket {
                        score,
                        count,
                        percentage: aggregation::percentage(count, scale.valid_answers),
                    })
                    .collect(),
            },
            QuestionSummary::Choice(choice) => ReportSummary::Choice {
                options: choice
                    .counts
                    .into_iter()
                    .map(|c| OptionShare {
                        percentage: aggregation::percentage(c.count, total_responses),
                        option: c.option,
                        count: c.count,
                        declared: c.declared,
                    })
                    .collect(),
            },
        }
    }
}

impl AnalyticsService {
    pub fn new(surveys: Arc<SurveyService>, responses: Arc<ResponseService>) -> Self {
        Self { surveys, responses }
    }

    /// Build the dashboard for `survey_id`; `NotFound` if the survey is absent
    pub fn survey_analytics(&self, survey_id: &str) -> Result<SurveyAnalytics, StorageError> {
        let survey = self.surveys.get(survey_id)?;
        let responses = self.responses.list_by_survey(survey_id)?;
        let total_responses = responses.len() as u64;

        debug!(
            survey_id = %survey_id,
            questions = survey.questions.len(),
            responses = total_responses,
            "Aggregating survey"
        );

        let questions = survey
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| QuestionReport {
                position: i + 1,
                question_id: question.id().to_string(),
                text: question.text().to_string(),
                kind: question.kind(),
                summary: ReportSummary::from_summary(
                    aggregation::summarize(question, &responses),
                    total_responses,
                ),
            })
            .collect();

        Ok(SurveyAnalytics {
            survey_id: survey.id,
            title: survey.title,
            total_responses,
            question_count: survey.questions.len(),
            questions,
        })
    }
}
