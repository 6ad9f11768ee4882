use rocket::response::{Responder, Response};
use rocket::{
    http::{ContentType, Status},
    response,
    serde::json::Json,
    Request,
};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ApiError {
    error: String,
}

impl ApiError {
    pub(crate) fn new(error: String) -> ApiError {
        ApiError { error }
    }
}

#[derive(Debug)]
pub(crate) struct ErrorResponse<T = ApiError> {
    json: Json<T>,
    status: Status,
}

impl ErrorResponse<ApiError> {
    pub(crate) fn new(status: Status, err: String) -> ErrorResponse<ApiError> {
        ErrorResponse {
            json: Json(ApiError::new(err)),
            status,
        }
    }
}

#[cfg(test)]
impl<T> ErrorResponse<T> {
    pub(crate) fn status(&self) -> Status {
        self.status
    }
}

impl<'r, T: serde::Serialize> Responder<'r, 'static> for ErrorResponse<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(self.json.respond_to(req)?)
            .status(self.status)
            .header(ContentType::JSON)
            .ok()
    }
}

/// Failures of the item operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ItemError {
    #[error("{0}")]
    Validation(String),

    #[error("Item not found.")]
    NotFound,

    #[error("Couldn't access database: {0}")]
    Database(#[from] diesel::result::Error),
}

impl From<ItemError> for ErrorResponse {
    fn from(err: ItemError) -> Self {
        let status = match &err {
            ItemError::Validation(_) => Status::BadRequest,
            ItemError::NotFound => Status::NotFound,
            ItemError::Database(inner) => {
                tracing::error!(error = %inner, "database operation failed");
                Status::InternalServerError
            }
        };
        ErrorResponse::new(status, err.to_string())
    }
}

/// Renders guard failures, unmatched routes and panics with the same JSON body.
#[catch(default)]
pub(crate) fn default_catcher(status: Status, req: &Request<'_>) -> ErrorResponse {
    tracing::debug!(status = status.code, uri = %req.uri(), "request failed before reaching a handler");
    ErrorResponse::new(
        status,
        status.reason().unwrap_or("Unknown error").to_string(),
    )
}
