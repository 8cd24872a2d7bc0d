//! Plugin API trait for identity verifier implementations.
//!
//! Each identity backend (Kerberos, AWS IAM) ships as a plugin implementing
//! this trait. The mapper service owns one verifier per backend and never
//! inspects the assertion itself.

use async_trait::async_trait;

use crate::error::NKeyMapperError;
use crate::models::{Backend, IdentityAssertion, VerifiedIdentity};

/// Plugin API trait for identity verifiers.
#[async_trait]
pub trait IdentityVerifierPluginClient: Send + Sync {
    /// The backend this verifier serves.
    fn backend(&self) -> Backend;

    /// Verify an assertion and extract its canonical identity.
    ///
    /// # Errors
    ///
    /// - `AssertionInvalid` if the assertion fails verification or belongs to another backend
    /// - `AssertionExpired` if the assertion is outside its validity window
    /// - `IdentityUnresolved` if verification yields no usable identity
    /// - `Transport` if a remote authority cannot be reached
    async fn verify(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<VerifiedIdentity, NKeyMapperError>;
}
