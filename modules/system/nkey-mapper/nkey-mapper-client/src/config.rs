//! Configuration for the mapper client.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperClientConfig {
    /// Base URL of the mapper, e.g. `https://nkey-mapper.example.com:8443`.
    pub mapper_url: String,

    /// Deadline of one mapper call, in seconds.
    pub request_timeout_secs: u64,

    /// How long the synchronous challenge callback waits, in seconds.
    pub sign_timeout_secs: u64,

    /// Threads of the worker runtime running the mapper calls.
    pub worker_threads: usize,

    pub kerberos: Option<KerberosClientConfig>,
    pub aws_iam: Option<AwsIamClientConfig>,
}

impl Default for MapperClientConfig {
    fn default() -> Self {
        Self {
            mapper_url: "http://127.0.0.1:8087".to_owned(),
            request_timeout_secs: 10,
            sign_timeout_secs: 30,
            worker_threads: 2,
            kerberos: None,
            aws_iam: None,
        }
    }
}

/// Kerberos account used to obtain a ticket for the mapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KerberosClientConfig {
    pub username: String,

    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,

    /// Kerberos realm / AD domain of the account.
    pub domain: String,

    /// SPN the mapper's service account is registered under.
    pub mapper_service_spn: String,
}

/// Explicit AWS credentials used to sign the `GetCallerIdentity` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsIamClientConfig {
    pub access_key_id: Option<String>,

    #[serde(deserialize_with = "deserialize_optional_secret")]
    pub secret_access_key: Option<SecretString>,

    #[serde(deserialize_with = "deserialize_optional_secret")]
    pub session_token: Option<SecretString>,
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn deserialize_optional_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretString>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|value| value.map(SecretString::from))
}
