use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Question not found")]
    QuestionNotFound,
    #[error("You didn't select a choice.")]
    MissingOrInvalidChoice,
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PollError::QuestionNotFound => (StatusCode::NOT_FOUND, "Question not found"),
            PollError::MissingOrInvalidChoice => {
                (StatusCode::BAD_REQUEST, "Missing or invalid choice")
            }
            PollError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
            PollError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for PollError {
    fn from(error: sqlx::Error) -> Self {
        tracing::error!("database error: {error}");
        PollError::DatabaseError(error.to_string())
    }
}
