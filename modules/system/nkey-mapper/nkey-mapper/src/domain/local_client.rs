//! Local (in-process) client for the `NKey` mapper.

use std::sync::Arc;

use async_trait::async_trait;
use nkey_mapper_sdk::{
    AwsIamAuthReply, AwsIamAuthRequest, Backend, KerberosAuthReply, KerberosAuthRequest,
    NKeyMapperClient, NKeyMapperError,
};

use super::{DomainError, Service};

/// Local client wrapping the service.
///
/// Served by the REST handlers and usable directly by in-process callers.
pub struct NKeyMapperLocalClient {
    svc: Arc<Service>,
}

impl NKeyMapperLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> NKeyMapperError {
    let e = NKeyMapperError::from(e);
    if matches!(e, NKeyMapperError::Configuration(_)) {
        tracing::error!(operation = op, error = %e, "nkey_mapper call failed");
    } else {
        tracing::debug!(operation = op, code = e.code(), "nkey_mapper call rejected");
    }
    e
}

#[async_trait]
impl NKeyMapperClient for NKeyMapperLocalClient {
    async fn kerberos_auth(
        &self,
        request: KerberosAuthRequest,
    ) -> Result<KerberosAuthReply, NKeyMapperError> {
        let (assertion, nonce) = request.into_parts();
        self.svc
            .authenticate(Backend::Kerberos, &assertion, &nonce)
            .await
            .map(KerberosAuthReply::from)
            .map_err(|e| log_and_convert("kerberos_auth", e))
    }

    async fn aws_iam_auth(
        &self,
        request: AwsIamAuthRequest,
    ) -> Result<AwsIamAuthReply, NKeyMapperError> {
        let (assertion, nonce) = request.into_parts();
        self.svc
            .authenticate(Backend::AwsIam, &assertion, &nonce)
            .await
            .map(AwsIamAuthReply::from)
            .map_err(|e| log_and_convert("aws_iam_auth", e))
    }
}
