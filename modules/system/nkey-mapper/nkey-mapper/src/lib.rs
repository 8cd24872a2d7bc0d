//! `NKey` Mapper Module
//!
//! Verifies identity assertions through the configured verifier plugins,
//! resolves the proven identity against an ordered mapping table and answers
//! with the mapped capability token and, when asked, a nonce signature made
//! with the mapped `NKey` seed.
//!
//! Provides the `NKeyMapperClient` implementation used in-process and the
//! REST endpoints serving remote clients.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod config;
pub mod domain;

pub use config::{MappingTableConfig, UserMappingConfig};
pub use domain::{MappingTable, NKeyMapperLocalClient, Service};
