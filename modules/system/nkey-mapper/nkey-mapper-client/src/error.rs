//! Client-side errors.

use nkey_mapper_sdk::NKeyMapperError;

/// Errors surfaced by the mapper client.
///
/// Mapper errors are carried unchanged so the broker connection attempt fails
/// with the originating error kind.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Mapper(#[from] NKeyMapperError),

    #[error("service identity proof failed: {0}")]
    ServiceProof(String),

    #[error("not authenticated to the identity service")]
    NotAuthenticatedToService,

    #[error("nonce signing timed out")]
    Timeout,

    #[error("mapper worker failed: {0}")]
    Worker(String),

    #[error("mapper client is closed")]
    Closed,
}

impl ClientError {
    /// The mapper error this client error carries, if any.
    #[must_use]
    pub fn as_mapper_error(&self) -> Option<&NKeyMapperError> {
        match self {
            Self::Mapper(e) => Some(e),
            _ => None,
        }
    }
}
