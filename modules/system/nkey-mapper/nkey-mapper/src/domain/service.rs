//! Domain service for the `NKey` mapper.

use std::collections::HashMap;
use std::sync::Arc;

use nkey_mapper_sdk::{AuthReply, Backend, IdentityAssertion, IdentityVerifierPluginClient};
use tracing::{info, warn};

use super::error::DomainError;
use super::mapping::MappingTable;
use super::signer;

/// A verifier paired with the mapping table of its backend.
struct MappedBackend {
    verifier: Arc<dyn IdentityVerifierPluginClient>,
    table: Arc<MappingTable>,
}

/// `NKey` mapper service.
///
/// Stateless per request: the mapping tables are read-only after
/// construction, so concurrent calls share them without locking.
#[derive(Default)]
pub struct Service {
    backends: HashMap<Backend, MappedBackend>,
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the verifier and mapping table of one backend.
    #[must_use]
    pub fn with_backend(
        mut self,
        verifier: Arc<dyn IdentityVerifierPluginClient>,
        table: MappingTable,
    ) -> Self {
        let backend = verifier.backend();
        if table.is_empty() {
            warn!(%backend, "mapping table is empty, no identity can be mapped for this backend");
        }
        info!(%backend, users = table.len(), "registered identity backend");
        self.backends.insert(
            backend,
            MappedBackend {
                verifier,
                table: Arc::new(table),
            },
        );
        self
    }

    #[must_use]
    pub fn is_configured(&self, backend: Backend) -> bool {
        self.backends.contains_key(&backend)
    }

    /// Verify an assertion, resolve its mapping and optionally sign a nonce.
    ///
    /// The mapped token is returned whether or not a nonce was supplied; the
    /// signature is empty when `nonce` is empty.
    ///
    /// # Errors
    ///
    /// - `BackendNotConfigured` if `backend` has no verifier or table
    /// - `BackendMismatch` if the assertion belongs to another backend
    /// - `Verifier` with the verifier's error, unchanged
    /// - `MappingNotFound` if the proven identity is not provisioned
    /// - `Signing` if the mapped seed cannot sign
    #[tracing::instrument(skip_all, fields(%backend, nonce_len = nonce.len()))]
    pub async fn authenticate(
        &self,
        backend: Backend,
        assertion: &IdentityAssertion,
        nonce: &[u8],
    ) -> Result<AuthReply, DomainError> {
        let mapped = self
            .backends
            .get(&backend)
            .ok_or(DomainError::BackendNotConfigured { backend })?;

        if assertion.backend() != backend {
            return Err(DomainError::BackendMismatch {
                expected: backend,
                actual: assertion.backend(),
            });
        }

        let verified = mapped.verifier.verify(assertion).await.inspect_err(|e| {
            warn!(error = %e, "identity assertion rejected");
        })?;

        let user = mapped.table.resolve(&verified.identity).inspect_err(|_| {
            warn!(identity = %verified.identity, "identity proven but not provisioned");
        })?;

        let nonce_signed = if nonce.is_empty() {
            Vec::new()
        } else {
            signer::sign_nonce(&user.nkey_seed, nonce).map_err(|e| {
                tracing::error!(identity = %verified.identity, error = %e, "nonce signing failed");
                DomainError::Signing {
                    identity: verified.identity.clone(),
                }
            })?
        };

        info!(
            identity = %verified.identity,
            pattern = %user.identity_pattern,
            nkey = %user.public_key,
            signed = !nonce_signed.is_empty(),
            "mapped identity"
        );

        Ok(AuthReply {
            jwt: user.jwt.clone(),
            nonce_signed,
            identity: verified.identity,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use nkey_mapper_sdk::{NKeyMapperError, VerifiedIdentity};
    use nkeys::KeyPair;
    use secrecy::SecretString;

    use super::*;
    use crate::config::{MappingTableConfig, UserMappingConfig};

    /// Verifier returning a fixed outcome and counting calls.
    struct StubVerifier {
        backend: Backend,
        outcome: Result<String, NKeyMapperError>,
        calls: AtomicUsize,
    }

    impl StubVerifier {
        fn ok(backend: Backend, identity: &str) -> Arc<Self> {
            Arc::new(Self {
                backend,
                outcome: Ok(identity.to_owned()),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(backend: Backend, e: NKeyMapperError) -> Arc<Self> {
            Arc::new(Self {
                backend,
                outcome: Err(e),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityVerifierPluginClient for StubVerifier {
        fn backend(&self) -> Backend {
            self.backend
        }

        async fn verify(
            &self,
            _assertion: &IdentityAssertion,
        ) -> Result<VerifiedIdentity, NKeyMapperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(VerifiedIdentity::new)
        }
    }

    fn kerberos_assertion() -> IdentityAssertion {
        IdentityAssertion::Kerberos {
            service_token: vec![0x6e, 0x82],
        }
    }

    fn aws_assertion() -> IdentityAssertion {
        IdentityAssertion::SignedRequest {
            timestamp: "20240102T030405Z".to_owned(),
            authorization: "AWS4-HMAC-SHA256 ...".to_owned(),
            extra_headers: std::collections::BTreeMap::new(),
        }
    }

    fn table_with(pattern: &str, seed: &KeyPair, jwt: &str) -> MappingTable {
        MappingTable::from_config(&MappingTableConfig {
            users: vec![UserMappingConfig {
                identity: pattern.to_owned(),
                nkey: SecretString::from(seed.seed().unwrap()),
                jwt: jwt.to_owned(),
            }],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn kerberos_without_nonce_returns_token_only() {
        let key = KeyPair::new_user();
        let svc = Service::new().with_backend(
            StubVerifier::ok(Backend::Kerberos, "alice@EXAMPLE"),
            table_with("alice@EXAMPLE", &key, "T"),
        );

        let reply = svc
            .authenticate(Backend::Kerberos, &kerberos_assertion(), &[])
            .await
            .unwrap();

        assert_eq!(reply.jwt, "T");
        assert!(reply.nonce_signed.is_empty());
        assert_eq!(reply.identity, "alice@EXAMPLE");
    }

    #[tokio::test]
    async fn nonce_is_signed_with_mapped_key() {
        let key = KeyPair::new_user();
        let svc = Service::new().with_backend(
            StubVerifier::ok(Backend::AwsIam, "arn:aws:iam::123:user/bob"),
            table_with("arn:aws:iam::123:user/*", &key, "T-bob"),
        );

        let nonce = b"server-nonce";
        let reply = svc
            .authenticate(Backend::AwsIam, &aws_assertion(), nonce)
            .await
            .unwrap();

        assert_eq!(reply.jwt, "T-bob");
        assert_eq!(reply.identity, "arn:aws:iam::123:user/bob");
        let public = KeyPair::from_public_key(&key.public_key()).unwrap();
        assert!(public.verify(nonce, &reply.nonce_signed).is_ok());
    }

    #[tokio::test]
    async fn repeated_resolution_is_stable() {
        let key = KeyPair::new_user();
        let svc = Service::new().with_backend(
            StubVerifier::ok(Backend::Kerberos, "alice@EXAMPLE"),
            table_with("alice@EXAMPLE", &key, "T"),
        );

        let first = svc
            .authenticate(Backend::Kerberos, &kerberos_assertion(), &[])
            .await
            .unwrap();
        let second = svc
            .authenticate(Backend::Kerberos, &kerberos_assertion(), &[])
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_backend_is_configuration_error() {
        let key = KeyPair::new_user();
        let verifier = StubVerifier::ok(Backend::Kerberos, "alice@EXAMPLE");
        let svc = Service::new().with_backend(verifier.clone(), table_with("alice@EXAMPLE", &key, "T"));

        let result = svc.authenticate(Backend::AwsIam, &aws_assertion(), &[]).await;

        assert!(matches!(
            result,
            Err(DomainError::BackendNotConfigured {
                backend: Backend::AwsIam
            })
        ));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_assertion_kind_is_rejected_before_verification() {
        let key = KeyPair::new_user();
        let verifier = StubVerifier::ok(Backend::Kerberos, "alice@EXAMPLE");
        let svc = Service::new().with_backend(verifier.clone(), table_with("alice@EXAMPLE", &key, "T"));

        let result = svc.authenticate(Backend::Kerberos, &aws_assertion(), &[]).await;

        assert!(matches!(result, Err(DomainError::BackendMismatch { .. })));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verifier_errors_propagate_unchanged() {
        let key = KeyPair::new_user();
        let original = NKeyMapperError::AssertionExpired("AMZ date outside of valid range".to_owned());
        let svc = Service::new().with_backend(
            StubVerifier::err(Backend::AwsIam, original.clone()),
            table_with("*", &key, "T"),
        );

        let err = svc
            .authenticate(Backend::AwsIam, &aws_assertion(), b"nonce")
            .await
            .unwrap_err();

        assert_eq!(NKeyMapperError::from(err), original);
    }

    #[tokio::test]
    async fn unmapped_identity_returns_no_token() {
        let key = KeyPair::new_user();
        let svc = Service::new().with_backend(
            StubVerifier::ok(Backend::Kerberos, "mallory@EXAMPLE"),
            table_with("alice@EXAMPLE", &key, "T"),
        );

        let err = svc
            .authenticate(Backend::Kerberos, &kerberos_assertion(), b"nonce")
            .await
            .unwrap_err();

        assert_eq!(
            NKeyMapperError::from(err),
            NKeyMapperError::MappingNotFound {
                identity: "mallory@EXAMPLE".to_owned()
            }
        );
    }
}
