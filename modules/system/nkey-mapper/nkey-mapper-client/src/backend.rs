//! Capability interface implemented by each identity backend.

use std::fmt;

use async_trait::async_trait;
use nkey_mapper_sdk::Backend;

use crate::error::ClientError;

/// Reply to a nonce-bearing mapper call.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedNonce {
    /// Capability token returned alongside the signature.
    pub jwt: String,
    pub signature: Vec<u8>,
}

impl fmt::Debug for SignedNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedNonce")
            .field("jwt", &format_args!("<{} chars>", self.jwt.len()))
            .field("signature", &format_args!("<{} bytes>", self.signature.len()))
            .finish()
    }
}

/// One way of proving identity to the mapper.
///
/// The service-proof step may mutate the backend (it stores the proof); the
/// mapper calls only read it.
#[async_trait]
pub trait MapperBackend: Send + Sync {
    fn backend(&self) -> Backend;

    /// Whether a usable service proof is held. Never performs I/O.
    fn is_authenticated_to_service(&self) -> bool;

    /// Obtain a fresh service proof.
    ///
    /// # Errors
    ///
    /// Returns `ServiceProof` if the identity service refuses the account.
    async fn authenticate_to_service(&mut self) -> Result<(), ClientError>;

    /// Ask the mapper for the capability token, without a nonce.
    ///
    /// # Errors
    ///
    /// Returns the mapper's error unchanged, or `NotAuthenticatedToService`
    /// if no service proof is held.
    async fn authenticate_to_mapper(&self) -> Result<String, ClientError>;

    /// Ask the mapper to sign a broker nonce.
    ///
    /// # Errors
    ///
    /// Same as [`MapperBackend::authenticate_to_mapper`].
    async fn sign_nonce(&self, nonce: &[u8]) -> Result<SignedNonce, ClientError>;
}
