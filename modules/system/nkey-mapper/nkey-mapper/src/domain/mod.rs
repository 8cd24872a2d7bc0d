//! Domain layer for the `NKey` mapper.

pub mod error;
pub mod local_client;
pub mod mapping;
pub mod service;
pub mod signer;

pub use error::DomainError;
pub use local_client::NKeyMapperLocalClient;
pub use mapping::{MappingTable, UserMapping};
pub use service::Service;
