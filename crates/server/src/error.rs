use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{msg}")]
    BadRequest { msg: String },

    #[error("Post not found")]
    NotFound,

    #[error("ERROR: {msg}")]
    DatabaseError { msg: String },
}

impl ServerError {
    pub fn bad_request(msg: String) -> Self {
        Self::BadRequest { msg }
    }

    pub fn database_error(msg: String) -> Self {
        Self::DatabaseError { msg }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DatabaseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ServerError>() {
            Ok(server_error) => server_error,
            Err(err) => Self::database_error(err.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
