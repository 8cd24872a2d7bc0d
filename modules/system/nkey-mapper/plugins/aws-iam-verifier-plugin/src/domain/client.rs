//! Client implementation for the AWS IAM identity verifier.
//!
//! Implements `IdentityVerifierPluginClient` using the domain service.

use async_trait::async_trait;
use nkey_mapper_sdk::{
    Backend, IdentityAssertion, IdentityVerifierPluginClient, NKeyMapperError, VerifiedIdentity,
};

use super::service::Service;

#[async_trait]
impl IdentityVerifierPluginClient for Service {
    fn backend(&self) -> Backend {
        Backend::AwsIam
    }

    async fn verify(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<VerifiedIdentity, NKeyMapperError> {
        match assertion {
            IdentityAssertion::SignedRequest {
                timestamp,
                authorization,
                extra_headers,
            } => {
                self.verify_request(timestamp, authorization, extra_headers)
                    .await
            }
            IdentityAssertion::Kerberos { .. } => Err(NKeyMapperError::AssertionInvalid(
                "expected a signed GetCallerIdentity request".to_owned(),
            )),
        }
    }
}
