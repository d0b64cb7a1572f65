//! Survey Store - survey storage and analytics service
//!
//! Stores survey definitions and respondent submissions in SQLite and serves
//! them, plus aggregated results, over a small JSON HTTP API.
//!
//! ## Architecture
//!
//! - **db**: SQLite tables `surveys` and `responses`, schema versioning
//! - **model**: Typed questions/answers and the codec for their JSON blobs
//! - **services**: Validation, event emission, analytics
//! - **aggregation**: Pure per-question summaries (counts, averages, histograms)
//! - **http**: hyper server exposing the API
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/survey-store/
//! ├── survey.db              # SQLite database (WAL mode)
//! └── config.toml            # Configuration
//! ```

pub mod aggregation;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod model;
pub mod services;

// Re-exports
pub use config::Config;
pub use db::SurveyDb;
pub use error::StorageError;
pub use http::HttpServer;
pub use model::{Answer, AnswerSheet, Question, QuestionKind, Survey, SurveyResponse};
pub use services::Services;
