//! HTTP response building helpers
//!
//! Every handler answers with JSON. Errors are `{"error": "..."}`; server-side
//! failures are logged here and reported with a generic message.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::StorageError;

/// Message returned for every 5xx
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Message returned when a request body does not decode
pub const REJECTED_BODY_MESSAGE: &str = "Missing required fields";

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// 200 OK
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// 201 Created with `{success: true, id}`
pub fn created_id(id: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::CREATED,
        &serde_json::json!({ "success": true, "id": id }),
    )
}

pub fn error_message(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    error_message(StatusCode::NOT_FOUND, message)
}

pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    error_message(StatusCode::BAD_REQUEST, message)
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    error_message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Convert a StorageError to an appropriate HTTP response
pub fn error_response(error: StorageError) -> Response<Full<Bytes>> {
    let status = match &error {
        StorageError::Validation(_) => StatusCode::BAD_REQUEST,
        StorageError::NotFound(_) => StatusCode::NOT_FOUND,
        StorageError::DuplicateKey(_) => StatusCode::CONFLICT,
        StorageError::Parse(_) | StorageError::Json(_) => StatusCode::BAD_REQUEST,
        StorageError::Database(_)
        | StorageError::Codec(_)
        | StorageError::Io(_)
        | StorageError::Config(_)
        | StorageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %error, "Request failed");
        return error_message(status, INTERNAL_ERROR_MESSAGE);
    }

    let message = match error {
        StorageError::Validation(msg) | StorageError::Parse(msg) => msg,
        StorageError::NotFound(what) => format!("{} not found", what),
        StorageError::DuplicateKey(id) => format!("id '{}' already exists", id),
        StorageError::Json(e) => {
            debug!(error = %e, "Rejected request body");
            REJECTED_BODY_MESSAGE.to_string()
        }
        other => other.to_string(),
    };
    error_message(status, &message)
}

/// Result type alias for handlers
pub type HandlerResult = Result<Response<Full<Bytes>>, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_ok_response() {
        let resp = ok(&serde_json::json!({"test": true}));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response_status_mapping() {
        assert_eq!(
            error_response(StorageError::NotFound("Survey".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(StorageError::Validation("Missing required fields".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(StorageError::DuplicateKey("s1".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(StorageError::Codec("bad blob".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_json_error_uses_fixed_message() {
        let err = serde_json::from_str::<serde_json::Value>("{\"answers\": oops").unwrap_err();
        let resp = error_response(StorageError::Json(err));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "error": REJECTED_BODY_MESSAGE })
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let resp = error_response(StorageError::Internal("disk at /var/lib exploded".into()));
        let body = body_json(resp).await;
        assert_eq!(body["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_created_id_body() {
        let resp = created_id("abc");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body, serde_json::json!({"success": true, "id": "abc"}));
    }
}
