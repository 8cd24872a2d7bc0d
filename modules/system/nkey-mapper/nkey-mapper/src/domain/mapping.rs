//! Identity-to-`NKey` mapping table.

use secrecy::SecretString;

use super::error::DomainError;
use super::signer;
use crate::config::MappingTableConfig;

/// Trailing marker turning a pattern into a prefix match.
pub const WILDCARD: char = '*';

/// Whether `identity` is matched by `pattern`.
///
/// Patterns ending in [`WILDCARD`] match every identity starting with the
/// rest of the pattern; all other patterns match only themselves. Matching is
/// case-sensitive.
#[must_use]
pub fn matches(identity: &str, pattern: &str) -> bool {
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => identity.starts_with(prefix),
        None => identity == pattern,
    }
}

/// One provisioned identity.
#[derive(Debug, Clone)]
pub struct UserMapping {
    pub identity_pattern: String,
    pub nkey_seed: SecretString,
    pub jwt: String,
    /// Public half of `nkey_seed`, safe to log.
    pub public_key: String,
}

/// Ordered, immutable mapping table of one backend.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    users: Vec<UserMapping>,
}

impl MappingTable {
    /// Build the table, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if an entry has an empty pattern, an
    /// empty token or an unusable seed.
    pub fn from_config(cfg: &MappingTableConfig) -> Result<Self, DomainError> {
        let users = cfg
            .users
            .iter()
            .enumerate()
            .map(|(index, user)| {
                if user.identity.is_empty() {
                    return Err(DomainError::invalid_configuration(format!(
                        "user mapping #{index} has an empty identity"
                    )));
                }
                if user.jwt.is_empty() {
                    return Err(DomainError::invalid_configuration(format!(
                        "user mapping '{}' has an empty jwt",
                        user.identity
                    )));
                }
                let public_key = signer::public_key(&user.nkey).map_err(|e| {
                    DomainError::invalid_configuration(format!(
                        "user mapping '{}': {e}",
                        user.identity
                    ))
                })?;
                Ok(UserMapping {
                    identity_pattern: user.identity.clone(),
                    nkey_seed: user.nkey.clone(),
                    jwt: user.jwt.clone(),
                    public_key,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { users })
    }

    /// Return the first entry matching `identity`.
    ///
    /// # Errors
    ///
    /// Returns `MappingNotFound` if no entry matches.
    pub fn resolve(&self, identity: &str) -> Result<&UserMapping, DomainError> {
        self.users
            .iter()
            .find(|user| matches(identity, &user.identity_pattern))
            .ok_or_else(|| DomainError::MappingNotFound {
                identity: identity.to_owned(),
            })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
