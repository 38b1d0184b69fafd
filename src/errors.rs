use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use mongodb::error::{ErrorKind, WriteFailure};
use serde_json::json;
use std::fmt;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug)]
pub enum ApiError {
    MissingField(String),
    InvalidEnum(String),
    DuplicateKey(String),
    NotFound(String),
    /// The row is still referenced by others.
    Conflict(String),
    InvalidInput(String),
    MalformedResponse {
        details: String,
        raw_response: String,
    },
    IncompleteItinerary {
        expected: u32,
        found: usize,
        raw_response: String,
    },
    UpstreamFailure(String),
    UpstreamTimeout(String),
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingField(msg)
            | ApiError::InvalidEnum(msg)
            | ApiError::DuplicateKey(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => write!(f, "{}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApiError::MalformedResponse { .. } => write!(f, "Failed to parse AI response as JSON"),
            ApiError::IncompleteItinerary {
                expected, found, ..
            } => write!(
                f,
                "Incomplete itinerary: Expected {} days but got {} days",
                expected, found
            ),
            ApiError::UpstreamFailure(msg) => write!(f, "Generation service error: {}", msg),
            ApiError::UpstreamTimeout(msg) => write!(f, "Generation service timed out: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::InvalidEnum(_)
            | ApiError::DuplicateKey(_)
            | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::MalformedResponse { .. }
            | ApiError::IncompleteItinerary { .. }
            | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}: {}", status, self);
        }

        let body = match self {
            ApiError::MalformedResponse {
                details,
                raw_response,
            } => json!({
                "error": self.to_string(),
                "details": details,
                "raw_response": raw_response,
            }),
            ApiError::IncompleteItinerary { raw_response, .. } => json!({
                "error": self.to_string(),
                "raw_response": raw_response,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        HttpResponse::build(status).json(body)
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return ApiError::DuplicateKey("Email already exists".to_string());
        }
        ApiError::InternalError(format!("Database error: {}", err))
    }
}

impl From<bson::ser::Error> for ApiError {
    fn from(err: bson::ser::Error) -> Self {
        ApiError::InternalError(format!("Failed to encode document: {}", err))
    }
}

impl From<bson::de::Error> for ApiError {
    fn from(err: bson::de::Error) -> Self {
        ApiError::InternalError(format!("Failed to decode document: {}", err))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn client_errors_map_to_400() {
        for err in [
            ApiError::MissingField("Missing required fields".into()),
            ApiError::InvalidEnum("Invalid badge value".into()),
            ApiError::DuplicateKey("Email already exists".into()),
            ApiError::InvalidInput("budget must be positive".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            ApiError::NotFound("Tourist not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("Tourist still has posts".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn upstream_errors_are_server_side() {
        assert_eq!(
            ApiError::UpstreamFailure("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::UpstreamTimeout("60s".into()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::IncompleteItinerary {
                expected: 3,
                found: 2,
                raw_response: String::new(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_rt::test]
    async fn malformed_response_body_carries_raw_text() {
        let err = ApiError::MalformedResponse {
            details: "expected value at line 1 column 1".into(),
            raw_response: "Sure! Here is your trip".into(),
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Failed to parse AI response as JSON");
        assert_eq!(body["raw_response"], "Sure! Here is your trip");
    }

    #[test]
    fn incomplete_itinerary_message_names_both_counts() {
        let err = ApiError::IncompleteItinerary {
            expected: 3,
            found: 2,
            raw_response: "{}".into(),
        };
        assert_eq!(
            err.to_string(),
            "Incomplete itinerary: Expected 3 days but got 2 days"
        );
    }
}
