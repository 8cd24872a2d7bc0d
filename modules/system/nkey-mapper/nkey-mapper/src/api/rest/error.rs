use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nkey_mapper_sdk::{ErrorBody, NKeyMapperError};

/// Error answered by the REST handlers.
#[derive(Debug)]
pub struct ApiError(pub NKeyMapperError);

/// HTTP status reported for each error kind.
#[must_use]
pub fn status_for(err: &NKeyMapperError) -> StatusCode {
    match err {
        NKeyMapperError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        NKeyMapperError::AssertionExpired(_)
        | NKeyMapperError::AssertionInvalid(_)
        | NKeyMapperError::IdentityUnresolved(_) => StatusCode::UNAUTHORIZED,
        NKeyMapperError::MappingNotFound { .. } => StatusCode::FORBIDDEN,
        NKeyMapperError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<NKeyMapperError> for ApiError {
    fn from(e: NKeyMapperError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(ErrorBody::from(&self.0))).into_response()
    }
}
