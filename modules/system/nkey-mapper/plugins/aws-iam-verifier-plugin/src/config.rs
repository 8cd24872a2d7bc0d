//! Configuration for the AWS IAM identity verifier.

use nkey_mapper_sdk::sts;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsIamVerifierConfig {
    /// STS endpoint the signed requests are replayed against. Only tests and
    /// private STS-compatible authorities need to change it.
    pub endpoint: String,

    /// Deadline of one replay, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum distance between the asserted date and our clock, in seconds.
    pub max_clock_skew_secs: u64,
}

impl Default for AwsIamVerifierConfig {
    fn default() -> Self {
        Self {
            endpoint: sts::REQUEST_ENDPOINT.to_owned(),
            request_timeout_secs: 10,
            max_clock_skew_secs: sts::MAX_CLOCK_SKEW.as_secs(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_public_sts() {
        let cfg: AwsIamVerifierConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.endpoint, "https://sts.amazonaws.com");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.max_clock_skew_secs, 300);
    }
}
