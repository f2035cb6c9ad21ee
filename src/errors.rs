use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use serde_json::json;

use crate::storage::StorageError;

#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(&'static str),
    #[display(fmt = "Note not found")]
    NotFound,
    #[display(fmt = "Note expired")]
    Expired,
    /// Unknown id and wrong token collapse into one outward response so the
    /// two cases cannot be told apart.
    #[display(fmt = "Note not found or invalid delete token")]
    DeleteRejected,
    #[display(fmt = "Internal server error")]
    Internal,
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> ApiError {
        // full detail stays in the server logs; clients get the opaque shape
        log::error!("storage failure: {}", err);
        ApiError::Internal
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::DeleteRejected => StatusCode::NOT_FOUND,
            ApiError::Expired => StatusCode::GONE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
            "statusCode": self.status_code().as_u16(),
        }))
    }
}
