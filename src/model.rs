//! Survey domain types and the JSON codec for stored blobs
//!
//! `questions` and `answers` are persisted as TEXT columns. This module is the
//! only place that turns those blobs into typed values and back:
//!
//! - [`encode_questions`] / [`decode_questions`] for a survey's question list
//! - [`encode_answers`] / [`decode_answers`] for a response's answer map
//!
//! Answer decoding is lenient so that historical rows written by older clients
//! never break reads: numbers become strings, and `null`, booleans and objects
//! are dropped as if the question had not been answered.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

// ============================================================================
// Questions
// ============================================================================

/// One prompt within a survey, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    Text {
        id: String,
        text: String,
    },
    SingleChoice {
        id: String,
        text: String,
        #[serde(default)]
        options: Vec<String>,
    },
    MultipleChoice {
        id: String,
        text: String,
        #[serde(default)]
        options: Vec<String>,
    },
    Scale {
        id: String,
        text: String,
    },
}

/// Question type without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    SingleChoice,
    MultipleChoice,
    Scale,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Scale => "scale",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Question {
    pub fn id(&self) -> &str {
        match self {
            Question::Text { id, .. }
            | Question::SingleChoice { id, .. }
            | Question::MultipleChoice { id, .. }
            | Question::Scale { id, .. } => id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::Text { text, .. }
            | Question::SingleChoice { text, .. }
            | Question::MultipleChoice { text, .. }
            | Question::Scale { text, .. } => text,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::Text { .. } => QuestionKind::Text,
            Question::SingleChoice { .. } => QuestionKind::SingleChoice,
            Question::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            Question::Scale { .. } => QuestionKind::Scale,
        }
    }

    /// Declared options; empty for text and scale questions
    pub fn options(&self) -> &[String] {
        match self {
            Question::SingleChoice { options, .. } | Question::MultipleChoice { options, .. } => {
                options
            }
            Question::Text { .. } | Question::Scale { .. } => &[],
        }
    }
}

/// Check the per-survey question invariants: non-empty unique ids, and at
/// least one option on every choice question.
pub fn validate_questions(questions: &[Question]) -> Result<(), StorageError> {
    let mut seen = std::collections::HashSet::new();

    for (index, question) in questions.iter().enumerate() {
        if question.id().is_empty() {
            return Err(StorageError::Validation(format!(
                "questions[{}]: id is required",
                index
            )));
        }
        if !seen.insert(question.id()) {
            return Err(StorageError::Validation(format!(
                "questions[{}]: duplicate question id '{}'",
                index,
                question.id()
            )));
        }
        let is_choice = matches!(
            question.kind(),
            QuestionKind::SingleChoice | QuestionKind::MultipleChoice
        );
        if is_choice && question.options().is_empty() {
            return Err(StorageError::Validation(format!(
                "questions[{}]: {} question requires at least one option",
                index,
                question.kind()
            )));
        }
    }

    Ok(())
}

// ============================================================================
// Answers
// ============================================================================

/// A respondent's answer to one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    /// text, single_choice and scale answers
    One(String),
    /// multiple_choice selections
    Many(Vec<String>),
}

impl Answer {
    /// Lenient conversion from a raw JSON value. Returns `None` for values
    /// that carry no answer (`null`, booleans, objects).
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Answer::One(s)),
            Value::Number(n) => Some(Answer::One(n.to_string())),
            Value::Array(items) => Some(Answer::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            Value::Null | Value::Bool(_) | Value::Object(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Answer::from_value(value)
            .ok_or_else(|| serde::de::Error::custom("answer must be a string or a list of strings"))
    }
}

/// Mapping from question id to answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerSheet(BTreeMap<String, Answer>);

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl Into<String>, answer: Answer) {
        self.0.insert(question_id.into(), answer);
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.0.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Answer)> for AnswerSheet {
    fn from_iter<I: IntoIterator<Item = (String, Answer)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for AnswerSheet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(id, value)| Answer::from_value(value).map(|a| (id, a)))
            .collect())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A stored survey with its decoded question list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: String,
}

/// A stored response with its decoded answers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyResponse {
    pub id: String,
    pub survey_id: String,
    pub answers: AnswerSheet,
    pub created_at: String,
}

/// Body of `POST /surveys`. Every field is optional so that missing input
/// surfaces as a validation error rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSurveyInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
}

/// Body of `POST /responses`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateResponseInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub answers: Option<AnswerSheet>,
}

// ============================================================================
// Codec
// ============================================================================

pub fn encode_questions(questions: &[Question]) -> Result<String, StorageError> {
    serde_json::to_string(questions)
        .map_err(|e| StorageError::Codec(format!("Failed to encode questions: {}", e)))
}

pub fn decode_questions(blob: &str) -> Result<Vec<Question>, StorageError> {
    serde_json::from_str(blob)
        .map_err(|e| StorageError::Codec(format!("Failed to decode questions: {}", e)))
}

pub fn encode_answers(answers: &AnswerSheet) -> Result<String, StorageError> {
    serde_json::to_string(answers)
        .map_err(|e| StorageError::Codec(format!("Failed to encode answers: {}", e)))
}

pub fn decode_answers(blob: &str) -> Result<AnswerSheet, StorageError> {
    serde_json::from_str(blob)
        .map_err(|e| StorageError::Codec(format!("Failed to decode answers: {}", e)))
}
