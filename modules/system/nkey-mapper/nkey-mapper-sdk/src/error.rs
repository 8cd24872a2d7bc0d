//! Error types for the `NKey` mapper.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when using the `NKey` mapper API.
///
/// Variants never carry secret material: no seeds, no capability tokens and
/// no raw assertions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NKeyMapperError {
    /// Operator setup is missing or invalid. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The assertion timestamp is outside the accepted window.
    #[error("assertion expired: {0}")]
    AssertionExpired(String),

    /// The assertion failed verification.
    #[error("assertion invalid: {0}")]
    AssertionInvalid(String),

    /// Verification succeeded but produced no usable identity.
    #[error("identity unresolved: {0}")]
    IdentityUnresolved(String),

    /// The identity was proven but is not provisioned in the mapping table.
    #[error("identity '{identity}' has no mapping")]
    MappingNotFound { identity: String },

    /// Network failure or timeout against the authority or the mapper.
    #[error("transport error: {0}")]
    Transport(String),
}

impl NKeyMapperError {
    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::AssertionExpired(_) => "assertion_expired",
            Self::AssertionInvalid(_) => "assertion_invalid",
            Self::IdentityUnresolved(_) => "identity_unresolved",
            Self::MappingNotFound { .. } => "mapping_not_found",
            Self::Transport(_) => "transport_error",
        }
    }

    /// The variant payload without the kind prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration(detail)
            | Self::AssertionExpired(detail)
            | Self::AssertionInvalid(detail)
            | Self::IdentityUnresolved(detail)
            | Self::Transport(detail) => detail,
            Self::MappingNotFound { identity } => identity,
        }
    }

    /// Rebuild an error from its code and detail.
    ///
    /// Unknown codes become `Transport`, since they can only come from a
    /// peer speaking a different protocol revision.
    #[must_use]
    pub fn from_code(code: &str, detail: String) -> Self {
        match code {
            "configuration_error" => Self::Configuration(detail),
            "assertion_expired" => Self::AssertionExpired(detail),
            "assertion_invalid" => Self::AssertionInvalid(detail),
            "identity_unresolved" => Self::IdentityUnresolved(detail),
            "mapping_not_found" => Self::MappingNotFound { identity: detail },
            "transport_error" => Self::Transport(detail),
            other => Self::Transport(format!("unexpected error code '{other}': {detail}")),
        }
    }
}

/// JSON error body exchanged between the mapper endpoints and HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<&NKeyMapperError> for ErrorBody {
    fn from(e: &NKeyMapperError) -> Self {
        Self {
            code: e.code().to_owned(),
            message: e.detail().to_owned(),
        }
    }
}

impl From<ErrorBody> for NKeyMapperError {
    fn from(body: ErrorBody) -> Self {
        Self::from_code(&body.code, body.message)
    }
}
