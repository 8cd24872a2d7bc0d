//! `NKey` nonce signing.
//!
//! Seeds stay wrapped in `SecretString` until the key pair is needed; the key
//! pair lives only for the duration of one call.

use nkeys::{KeyPair, KeyPairType};
use secrecy::{ExposeSecret, SecretString};

/// Why a seed cannot be used for signing. Never includes the seed itself.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("not a valid NKey seed: {0}")]
    Malformed(String),
    #[error("NKey seed is not a user seed")]
    NotUserSeed,
}

/// Check that a seed is a user seed and return its public key.
///
/// # Errors
///
/// Returns [`SeedError`] if the seed cannot be decoded or is not a user seed.
pub fn public_key(seed: &SecretString) -> Result<String, SeedError> {
    let pair = key_pair(seed)?;
    if !matches!(pair.key_pair_type(), KeyPairType::User) {
        return Err(SeedError::NotUserSeed);
    }
    Ok(pair.public_key())
}

/// Sign a broker nonce with the given seed.
///
/// # Errors
///
/// Returns [`SeedError`] if the seed cannot be decoded or signing fails.
pub fn sign_nonce(seed: &SecretString, nonce: &[u8]) -> Result<Vec<u8>, SeedError> {
    let pair = key_pair(seed)?;
    pair.sign(nonce)
        .map_err(|e| SeedError::Malformed(e.to_string()))
}

fn key_pair(seed: &SecretString) -> Result<KeyPair, SeedError> {
    KeyPair::from_seed(seed.expose_secret()).map_err(|e| SeedError::Malformed(e.to_string()))
}
