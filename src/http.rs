//! HTTP API for surveys, responses and analytics
//!
//! - `GET /health` - Health check with row counts
//! - `GET /surveys` - All surveys, newest first
//! - `GET /surveys?id={id}` - One survey
//! - `POST /surveys` - Create a survey `{id, title, description?, questions}`
//! - `GET /responses?surveyId={id}` - Responses for a survey, newest first
//! - `POST /responses` - Submit a response `{id, survey_id, answers}`
//! - `GET /analytics?surveyId={id}` - Aggregated results for a survey
//!
//! Every route is also reachable under an `/api` prefix.
//!
//! Survey `questions` and response `answers` are sent as JSON values, not
//! as the encoded text stored in SQLite. Clients read them directly
//! without a second parse.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST -H "Content-Type: application/json" \
//!      -d '{"id":"s1","title":"Lunch","questions":[{"id":"q1","type":"scale","text":"Rate it"}]}' \
//!      http://localhost:8090/surveys
//!
//! curl -X POST -H "Content-Type: application/json" \
//!      -d '{"id":"r1","survey_id":"s1","answers":{"q1":"8"}}' \
//!      http://localhost:8090/responses
//!
//! curl "http://localhost:8090/analytics?surveyId=s1"
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::StorageError;
use crate::model::{CreateResponseInput, CreateSurveyInput};
use crate::services::response::{self, HandlerResult};
use crate::services::Services;

/// Query parameters accepted by the GET routes. A repeated key keeps its
/// first value.
#[derive(Debug, Default)]
struct RouteQuery {
    id: Option<String>,
    survey_id: Option<String>,
}

impl RouteQuery {
    fn parse(query: Option<&str>) -> Result<Self, StorageError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.unwrap_or(""))
            .map_err(|e| StorageError::Parse(format!("Invalid query string: {}", e)))?;

        let mut parsed = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut parsed.id,
                "surveyId" => &mut parsed.survey_id,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        Ok(parsed)
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }

    fn survey_id(&self) -> Option<&str> {
        self.survey_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// HTTP server state
pub struct HttpServer {
    services: Arc<Services>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(services: Arc<Services>, bind_addr: SocketAddr) -> Self {
        Self {
            services,
            bind_addr,
        }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn run(self: Arc<Self>) -> Result<(), StorageError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<(), StorageError> {
        info!(addr = %listener.local_addr()?, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let request_id = Uuid::new_v4();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);
        let span = info_span!("request", %request_id, %method, %path);

        async move {
            debug!("Incoming request");

            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!(error = %e, "Failed to read request body");
                    return Ok(response::bad_request("Failed to read request body"));
                }
            };

            let resp = self.dispatch(&method, &path, query.as_deref(), &body);
            debug!(status = %resp.status(), "Request complete");
            Ok(resp)
        }
        .instrument(span)
        .await
    }

    /// Route a request that has already been read into memory
    pub fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: &[u8],
    ) -> Response<Full<Bytes>> {
        let path = path
            .strip_prefix("/api")
            .filter(|p| p.starts_with('/'))
            .unwrap_or(path);

        let result = match (method, path) {
            (&Method::GET, "/health") => self.handle_health(),

            (&Method::GET, "/surveys") => self.handle_get_surveys(query),
            (&Method::POST, "/surveys") => self.handle_create_survey(body),
            (_, "/surveys") => Ok(response::method_not_allowed()),

            (&Method::GET, "/responses") => self.handle_get_responses(query),
            (&Method::POST, "/responses") => self.handle_create_response(body),
            (_, "/responses") => Ok(response::method_not_allowed()),

            (&Method::GET, "/analytics") => self.handle_get_analytics(query),
            (_, "/analytics") => Ok(response::method_not_allowed()),

            _ => Ok(response::not_found("Not Found")),
        };

        result.unwrap_or_else(response::error_response)
    }

    fn handle_health(&self) -> HandlerResult {
        let stats = self.services.db.stats()?;
        Ok(response::ok(&serde_json::json!({
            "status": "ok",
            "surveys": stats.survey_count,
            "responses": stats.response_count,
        })))
    }

    /// GET /surveys[?id=]
    fn handle_get_surveys(&self, query: Option<&str>) -> HandlerResult {
        let query = RouteQuery::parse(query)?;

        match query.id() {
            Some(id) => Ok(response::ok(&self.services.surveys.get(id)?)),
            None => Ok(response::ok(&self.services.surveys.list_all()?)),
        }
    }

    /// POST /surveys
    fn handle_create_survey(&self, body: &[u8]) -> HandlerResult {
        let input: CreateSurveyInput = serde_json::from_slice(body)?;
        let survey = self.services.surveys.create(input)?;
        Ok(response::created_id(&survey.id))
    }

    /// GET /responses?surveyId=
    fn handle_get_responses(&self, query: Option<&str>) -> HandlerResult {
        let query = RouteQuery::parse(query)?;
        let survey_id = query
            .survey_id()
            .ok_or_else(|| StorageError::Validation("Survey ID is required".into()))?;

        Ok(response::ok(&self.services.responses.list_by_survey(survey_id)?))
    }

    /// POST /responses
    fn handle_create_response(&self, body: &[u8]) -> HandlerResult {
        let input: CreateResponseInput = serde_json::from_slice(body)?;
        let created = self.services.responses.create(input)?;
        Ok(response::created_id(&created.id))
    }

    /// GET /analytics?surveyId=
    fn handle_get_analytics(&self, query: Option<&str>) -> HandlerResult {
        let query = RouteQuery::parse(query)?;
        let survey_id = query
            .survey_id()
            .ok_or_else(|| StorageError::Validation("Survey ID is required".into()))?;

        Ok(response::ok(&self.services.analytics.survey_analytics(survey_id)?))
    }
}
