//! Configuration for the Kerberos identity verifier.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Default tolerated difference between the authenticator time and ours.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;

/// Service account the mapper runs as.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KerberosVerifierConfig {
    /// Service principal name tickets are issued for, e.g. `HTTP/host`.
    pub spn: String,

    /// Realm of the service account.
    pub realm: String,

    /// Password of the service account. Never logged.
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Maximum authenticator clock skew, in seconds.
    pub clock_skew_secs: u64,
}

impl Default for KerberosVerifierConfig {
    fn default() -> Self {
        Self {
            spn: String::new(),
            realm: String::new(),
            password: SecretString::from(String::new()),
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
        }
    }
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
