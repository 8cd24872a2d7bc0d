//! Hooks into the broker client's connect options.

use std::sync::Arc;

use crate::error::ClientError;

/// Synchronous nonce-signing callback invoked by the broker's connection
/// layer during its `NKey` handshake.
pub trait NonceSigner: Send + Sync {
    /// Sign a server-issued nonce.
    ///
    /// # Errors
    ///
    /// Any error aborts the connection attempt.
    fn sign_nonce(&self, nonce: &[u8]) -> Result<Vec<u8>, ClientError>;
}

/// The part of a broker client's connect options the mapper client drives.
pub trait BrokerConnectOptions {
    /// Install the user JWT and the callback signing the server nonce.
    fn set_nkey(&mut self, jwt: String, signer: Arc<dyn NonceSigner>);
}
