#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `NKey` Mapper SDK
//!
//! This crate provides the public API shared by the mapper service, its
//! identity verifier plugins and the client-side challenge adapter:
//!
//! - [`NKeyMapperClient`] - Public API trait for the two mapper RPCs
//! - [`IdentityVerifierPluginClient`] - Plugin API trait for identity backends
//! - [`IdentityAssertion`], [`AuthReply`] - Domain models
//! - [`KerberosAuthRequest`], [`AwsIamAuthRequest`] and their replies - Wire models
//! - [`NKeyMapperError`] - Error kinds surfaced to callers
//! - [`sts`] - Fixed `GetCallerIdentity` request parameters shared by client and server
//!
//! ## Usage
//!
//! ```ignore
//! use nkey_mapper_sdk::{KerberosAuthRequest, NKeyMapperClient};
//!
//! let reply = mapper
//!     .kerberos_auth(KerberosAuthRequest::new(ticket_bytes, Vec::new()))
//!     .await?;
//! let jwt = reply.jwt;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod plugin_api;
pub mod sts;

// Re-export main types at crate root
pub use api::{AWS_IAM_AUTH_PATH, KERBEROS_AUTH_PATH, NKeyMapperClient};
pub use error::{ErrorBody, NKeyMapperError};
pub use models::{
    AuthReply, AwsIamAuthReply, AwsIamAuthRequest, Backend, IdentityAssertion,
    KerberosAuthReply, KerberosAuthRequest, VerifiedIdentity,
};
pub use plugin_api::IdentityVerifierPluginClient;
