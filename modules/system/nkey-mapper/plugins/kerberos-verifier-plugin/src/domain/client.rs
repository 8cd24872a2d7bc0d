//! Client implementation for the Kerberos identity verifier.
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
        Backend::Kerberos
    }

    async fn verify(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<VerifiedIdentity, NKeyMapperError> {
        match assertion {
            IdentityAssertion::Kerberos { service_token } => self.verify_token(service_token),
            IdentityAssertion::SignedRequest { .. } => Err(NKeyMapperError::AssertionInvalid(
                "expected a Kerberos service token".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::domain::decoder::{DecodeError, DecodedTicket, TicketDecoder};

    struct RejectAll;

    impl TicketDecoder for RejectAll {
        fn decode(&self, _token: &[u8]) -> Result<DecodedTicket, DecodeError> {
            Err(DecodeError::UnsupportedEtype(1))
        }
    }

    fn plugin() -> Service {
        Service::with_decoder(Box::new(RejectAll), Duration::from_secs(300))
    }

    #[test]
    fn plugin_trait_reports_kerberos_backend() {
        let service = plugin();
        let plugin: &dyn IdentityVerifierPluginClient = &service;
        assert_eq!(plugin.backend(), Backend::Kerberos);
    }

    #[tokio::test]
    async fn plugin_trait_rejects_signed_requests() {
        let service = plugin();
        let plugin: &dyn IdentityVerifierPluginClient = &service;

        let assertion = IdentityAssertion::SignedRequest {
            timestamp: "20240101T000000Z".to_owned(),
            authorization: "AWS4-HMAC-SHA256".to_owned(),
            extra_headers: BTreeMap::new(),
        };
        match plugin.verify(&assertion).await {
            Err(NKeyMapperError::AssertionInvalid(_)) => {}
            other => panic!("Expected AssertionInvalid, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plugin_trait_empty_token_invalid() {
        let service = plugin();
        let plugin: &dyn IdentityVerifierPluginClient = &service;

        let assertion = IdentityAssertion::Kerberos {
            service_token: Vec::new(),
        };
        assert!(matches!(
            plugin.verify(&assertion).await,
            Err(NKeyMapperError::AssertionInvalid(_))
        ));
    }
}
