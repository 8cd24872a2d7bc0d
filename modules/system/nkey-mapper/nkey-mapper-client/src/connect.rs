//! Adapters built from client configuration.

use std::sync::Arc;
use std::time::Duration;

use nkey_mapper_sdk::{NKeyMapperClient, NKeyMapperError};

use crate::adapter::{AdapterOptions, ChallengeAdapter};
use crate::aws_iam::AwsIamMapperBackend;
use crate::config::MapperClientConfig;
use crate::error::ClientError;
use crate::kerberos::{KerberosMapperBackend, KerberosTicketClient};
use crate::transport::HttpMapperClient;

impl From<&MapperClientConfig> for AdapterOptions {
    fn from(cfg: &MapperClientConfig) -> Self {
        Self {
            sign_timeout: Duration::from_secs(cfg.sign_timeout_secs),
            worker_threads: cfg.worker_threads,
        }
    }
}

fn http_mapper(cfg: &MapperClientConfig) -> Result<Arc<dyn NKeyMapperClient>, ClientError> {
    let client = HttpMapperClient::new(&cfg.mapper_url, Duration::from_secs(cfg.request_timeout_secs))?;
    Ok(Arc::new(client))
}

/// Kerberos adapter talking to the mapper at `cfg.mapper_url`.
///
/// # Errors
///
/// Returns `Configuration` if the `kerberos` section is missing or the
/// mapper URL is invalid, `Worker` if the worker runtime cannot start.
pub fn kerberos_adapter(
    cfg: &MapperClientConfig,
    tickets: Arc<dyn KerberosTicketClient>,
) -> Result<ChallengeAdapter<KerberosMapperBackend>, ClientError> {
    let kerberos = cfg.kerberos.as_ref().ok_or_else(|| {
        NKeyMapperError::Configuration("provided options missing Kerberos configuration".to_owned())
    })?;
    let backend = KerberosMapperBackend::new(kerberos, tickets, http_mapper(cfg)?);
    ChallengeAdapter::new(backend, AdapterOptions::from(cfg))
}

/// AWS IAM adapter talking to the mapper at `cfg.mapper_url`.
///
/// Credentials are taken from the `aws_iam` section on first use; a missing
/// section fails the service-proof step, not construction.
///
/// # Errors
///
/// Returns `Configuration` if the mapper URL is invalid, `Worker` if the
/// worker runtime cannot start.
pub fn aws_iam_adapter(
    cfg: &MapperClientConfig,
) -> Result<ChallengeAdapter<AwsIamMapperBackend>, ClientError> {
    let backend = AwsIamMapperBackend::new(cfg.aws_iam.clone().unwrap_or_default(), http_mapper(cfg)?);
    ChallengeAdapter::new(backend, AdapterOptions::from(cfg))
}
