//! AWS IAM backend: proves identity with a signed `GetCallerIdentity` request.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{SignableBody, SignableRequest, SigningParams, SigningSettings, sign};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use nkey_mapper_sdk::{AwsIamAuthRequest, Backend, NKeyMapperClient, sts};
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::{MapperBackend, SignedNonce};
use crate::config::AwsIamClientConfig;
use crate::error::ClientError;

const CREDENTIALS_PROVIDER: &str = "nkey-mapper-client";

/// The parts of a signed `GetCallerIdentity` request the mapper needs.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedCallerIdentity {
    pub amz_date: String,
    pub authorization: String,
    /// Signed headers other than `Authorization`.
    pub headers: BTreeMap<String, Vec<String>>,
}

impl fmt::Debug for SignedCallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCallerIdentity")
            .field("amz_date", &self.amz_date)
            .field(
                "authorization",
                &format_args!("<{} chars>", self.authorization.len()),
            )
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Signs the fixed STS request.
pub trait CallerIdentitySigner: Send + Sync {
    /// Sign the request as of `at`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceProof` if the request cannot be signed.
    fn sign(&self, at: OffsetDateTime) -> Result<SignedCallerIdentity, ClientError>;
}

/// SigV4 signer holding explicit credentials.
pub struct SigV4CallerIdentitySigner {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
}

impl SigV4CallerIdentitySigner {
    #[must_use]
    pub fn new(
        access_key_id: String,
        secret_access_key: SecretString,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            session_token,
        }
    }

    /// Build a signer from explicit credentials in the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServiceProof` if the access key or secret key is missing.
    pub fn from_config(cfg: &AwsIamClientConfig) -> Result<Self, ClientError> {
        match (&cfg.access_key_id, &cfg.secret_access_key) {
            (Some(access_key_id), Some(secret)) if !access_key_id.is_empty() => Ok(Self::new(
                access_key_id.clone(),
                secret.clone(),
                cfg.session_token.clone(),
            )),
            _ => Err(ClientError::ServiceProof(
                "AWS credentials could not be resolved".to_owned(),
            )),
        }
    }

    fn identity(&self) -> Identity {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.expose_secret().to_owned(),
            self.session_token
                .as_ref()
                .map(|token| token.expose_secret().to_owned()),
            None,
            CREDENTIALS_PROVIDER,
        )
        .into()
    }
}

impl CallerIdentitySigner for SigV4CallerIdentitySigner {
    fn sign(&self, at: OffsetDateTime) -> Result<SignedCallerIdentity, ClientError> {
        let identity = self.identity();
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(sts::REQUEST_REGION)
            .name(sts::REQUEST_SERVICE)
            .time(SystemTime::from(at))
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| ClientError::ServiceProof(format!("invalid signing parameters: {e}")))?
            .into();

        let request = SignableRequest::new(
            sts::REQUEST_METHOD,
            sts::REQUEST_ENDPOINT,
            [("content-type", sts::REQUEST_CONTENT_TYPE)].into_iter(),
            SignableBody::Bytes(sts::REQUEST_BODY.as_bytes()),
        )
        .map_err(|e| ClientError::ServiceProof(format!("unsignable request: {e}")))?;

        let (instructions, _signature) = sign(request, &params)
            .map_err(|e| ClientError::ServiceProof(format!("signing failed: {e}")))?
            .into_parts();

        let mut authorization = None;
        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in instructions.headers() {
            if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.to_owned());
            } else {
                headers
                    .entry(name.to_ascii_lowercase())
                    .or_default()
                    .push(value.to_owned());
            }
        }

        let authorization = authorization.ok_or_else(|| {
            ClientError::ServiceProof("signer produced no authorization header".to_owned())
        })?;
        let amz_date = sts::format_amz_date(at)
            .map_err(|e| ClientError::ServiceProof(format!("unformattable date: {e}")))?;

        Ok(SignedCallerIdentity {
            amz_date,
            authorization,
            headers,
        })
    }
}

/// [`MapperBackend`] presenting a signed `GetCallerIdentity` request.
///
/// A fresh request is signed for every mapper call, so each one carries a
/// current date.
pub struct AwsIamMapperBackend {
    config: AwsIamClientConfig,
    signer: Option<Arc<dyn CallerIdentitySigner>>,
    mapper: Arc<dyn NKeyMapperClient>,
}

impl AwsIamMapperBackend {
    /// Backend resolving its credentials from `config` on first use.
    #[must_use]
    pub fn new(config: AwsIamClientConfig, mapper: Arc<dyn NKeyMapperClient>) -> Self {
        info!("aws iam mapper client initialized");
        Self {
            config,
            signer: None,
            mapper,
        }
    }

    /// Backend using an already configured signer.
    #[must_use]
    pub fn with_signer(signer: Arc<dyn CallerIdentitySigner>, mapper: Arc<dyn NKeyMapperClient>) -> Self {
        Self {
            config: AwsIamClientConfig::default(),
            signer: Some(signer),
            mapper,
        }
    }

    fn request(&self, nonce: Vec<u8>) -> Result<AwsIamAuthRequest, ClientError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(ClientError::NotAuthenticatedToService)?;
        let signed = signer.sign(OffsetDateTime::now_utc())?;
        Ok(AwsIamAuthRequest {
            sts_amz_iso8601_date: signed.amz_date,
            sts_authorization: signed.authorization,
            sts_additional_headers: signed.headers,
            nonce,
        })
    }
}

#[async_trait]
impl MapperBackend for AwsIamMapperBackend {
    fn backend(&self) -> Backend {
        Backend::AwsIam
    }

    fn is_authenticated_to_service(&self) -> bool {
        self.signer.is_some()
    }

    async fn authenticate_to_service(&mut self) -> Result<(), ClientError> {
        let signer = SigV4CallerIdentitySigner::from_config(&self.config)?;
        debug!(access_key_id = %signer.access_key_id, "resolved explicit AWS credentials");
        self.signer = Some(Arc::new(signer));
        Ok(())
    }

    async fn authenticate_to_mapper(&self) -> Result<String, ClientError> {
        let reply = self.mapper.aws_iam_auth(self.request(Vec::new())?).await?;
        debug!(identity = %reply.identity_arn, "mapper resolved aws identity");
        Ok(reply.jwt)
    }

    async fn sign_nonce(&self, nonce: &[u8]) -> Result<SignedNonce, ClientError> {
        let reply = self.mapper.aws_iam_auth(self.request(nonce.to_vec())?).await?;
        Ok(SignedNonce {
            jwt: reply.jwt,
            signature: reply.nonce_signed,
        })
    }
}
