//! Service layer for survey-store
//!
//! Services sit between the HTTP handlers and the row operations in `db`:
//!
//! ```text
//! HTTP Handlers (thin)
//!     ↓
//! Service Layer (validation, codec, events)
//!     ↓
//! Repository Layer (db/*.rs)
//!     ↓
//! SQLite Database
//! ```

pub mod analytics_service;
pub mod events;
pub mod response;
pub mod response_service;
pub mod survey_service;

// Re-exports
pub use analytics_service::{AnalyticsService, SurveyAnalytics};
pub use events::{EventBus, EventListener, StorageEvent};
pub use response_service::ResponseService;
pub use survey_service::SurveyService;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::config::Config;
use crate::db::SurveyDb;

/// Service container for dependency injection
///
/// Holds all services with a shared database handle.
/// Pass this to HttpServer for handler access.
pub struct Services {
    pub db: Arc<SurveyDb>,
    pub surveys: Arc<SurveyService>,
    pub responses: Arc<ResponseService>,
    pub analytics: Arc<AnalyticsService>,
    pub events: Arc<EventBus>,
}

impl Services {
    /// Create all services over one database handle
    pub fn new(db: Arc<SurveyDb>, config: &Config) -> Self {
        let events = Arc::new(EventBus::new());
        let surveys = Arc::new(SurveyService::new(db.clone(), events.clone()));
        let responses = Arc::new(
            ResponseService::new(db.clone(), events.clone())
                .with_survey_check(config.require_existing_survey),
        );
        let analytics = Arc::new(AnalyticsService::new(surveys.clone(), responses.clone()));

        Self {
            db,
            surveys,
            responses,
            analytics,
            events,
        }
    }
}

/// Server-assigned creation time: RFC 3339 UTC with milliseconds, so that
/// text ordering in SQLite matches chronological ordering
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_format() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        // 2026-10-16T12:34:56.789Z
        assert_eq!(ts.len(), 24);
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_services_share_database() {
        let db = Arc::new(SurveyDb::open_in_memory().unwrap());
        let services = Services::new(db, &Config::default());
        assert_eq!(services.db.stats().unwrap().survey_count, 0);
        assert_eq!(services.events.subscriber_count(), 0);
    }
}
