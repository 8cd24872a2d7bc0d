#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! AWS IAM Identity Verifier Plugin
//!
//! Verifies a caller's AWS identity by replaying the SigV4-signed
//! `GetCallerIdentity` request it presented against the STS endpoint. STS
//! checks the signature; a successful answer names the caller's ARN.
//!
//! The mapper never sees the caller's secret key, only a signature valid for
//! this one request during its short validity window.
//!
//! ## Configuration
//!
//! ```yaml
//! aws_iam:
//!   verifier:
//!     endpoint: "https://sts.amazonaws.com"
//!     request_timeout_secs: 10
//!     max_clock_skew_secs: 300
//! ```

pub mod config;
pub mod domain;

pub use config::AwsIamVerifierConfig;
pub use domain::service::Service;
pub use domain::sts_response::CallerIdentity;
