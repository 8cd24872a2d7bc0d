//! Domain errors for the `NKey` mapper.

use nkey_mapper_sdk::{Backend, NKeyMapperError};

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("missing {backend} configuration -- {backend} mapping is unsupported")]
    BackendNotConfigured { backend: Backend },

    #[error("invalid mapping configuration: {0}")]
    InvalidConfiguration(String),

    #[error("assertion for {actual} sent to the {expected} endpoint")]
    BackendMismatch { expected: Backend, actual: Backend },

    #[error("identity '{identity}' has no mapping")]
    MappingNotFound { identity: String },

    #[error("could not sign nonce for identity '{identity}'")]
    Signing { identity: String },

    #[error(transparent)]
    Verifier(#[from] NKeyMapperError),
}

impl DomainError {
    #[must_use]
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

impl From<DomainError> for NKeyMapperError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::BackendNotConfigured { .. }
            | DomainError::InvalidConfiguration(_)
            | DomainError::Signing { .. } => Self::Configuration(e.to_string()),
            DomainError::BackendMismatch { .. } => Self::AssertionInvalid(e.to_string()),
            DomainError::MappingNotFound { identity } => Self::MappingNotFound { identity },
            DomainError::Verifier(inner) => inner,
        }
    }
}
