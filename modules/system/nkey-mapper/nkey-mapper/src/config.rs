//! Configuration for the `NKey` mapper tables.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Mapping table of one identity backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingTableConfig {
    /// Ordered user mappings. The first matching entry wins.
    pub users: Vec<UserMappingConfig>,
}

/// Maps an identity pattern to an `NKey` seed and capability token.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserMappingConfig {
    /// Exact identity, or a prefix followed by `*`.
    #[serde(alias = "name", alias = "arn")]
    pub identity: String,

    /// `NKey` user seed (`SU...`). Never logged.
    #[serde(deserialize_with = "deserialize_secret")]
    pub nkey: SecretString,

    /// Capability token returned to the mapped identity.
    pub jwt: String,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
