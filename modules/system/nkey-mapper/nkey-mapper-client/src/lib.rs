#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! `NKey` Mapper Client
//!
//! Lets a broker client authenticate with the broker's `NKey` challenge while
//! proving its identity through Kerberos or AWS IAM. The client first proves
//! its identity to the external service, then asks the mapper for the
//! capability token provisioned for that identity, and finally answers the
//! broker's nonce challenge by having the mapper sign it.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use nkey_mapper_client::{aws_iam_adapter, BrokerConnectOptions, ClientError, MapperClientConfig, NonceSigner};
//! # struct Options;
//! # impl BrokerConnectOptions for Options {
//! #     fn set_nkey(&mut self, _jwt: String, _signer: Arc<dyn NonceSigner>) {}
//! # }
//! # async fn connect(cfg: MapperClientConfig) -> Result<(), ClientError> {
//! let adapter = Arc::new(aws_iam_adapter(&cfg)?);
//! let mut options = Options;
//! adapter.attach(&mut options).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod aws_iam;
pub mod backend;
pub mod broker;
pub mod config;
pub mod connect;
pub mod error;
pub mod kerberos;
pub mod transport;

pub use adapter::{AdapterOptions, ChallengeAdapter, ClientSessionState};
pub use aws_iam::{AwsIamMapperBackend, CallerIdentitySigner, SigV4CallerIdentitySigner, SignedCallerIdentity};
pub use backend::{MapperBackend, SignedNonce};
pub use broker::{BrokerConnectOptions, NonceSigner};
pub use config::{AwsIamClientConfig, KerberosClientConfig, MapperClientConfig};
pub use connect::{aws_iam_adapter, kerberos_adapter};
pub use error::ClientError;
pub use kerberos::{KerberosCredential, KerberosMapperBackend, KerberosTicketClient, ServiceTicket};
pub use transport::HttpMapperClient;
