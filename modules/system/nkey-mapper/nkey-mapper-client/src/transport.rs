//! HTTP transport to a remote mapper.

use std::time::Duration;

use async_trait::async_trait;
use nkey_mapper_sdk::{
    AWS_IAM_AUTH_PATH, AwsIamAuthReply, AwsIamAuthRequest, ErrorBody, KERBEROS_AUTH_PATH,
    KerberosAuthReply, KerberosAuthRequest, NKeyMapperClient, NKeyMapperError,
};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// [`NKeyMapperClient`] talking to the mapper's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpMapperClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpMapperClient {
    /// Create a client for the mapper at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, NKeyMapperError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            NKeyMapperError::Configuration(format!("invalid mapper URL '{base_url}': {e}"))
        })?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| NKeyMapperError::Configuration(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    async fn call<Req, Rep>(&self, path: &str, request: &Req) -> Result<Rep, NKeyMapperError>
    where
        Req: Serialize + Sync,
        Rep: DeserializeOwned,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| NKeyMapperError::Configuration(format!("invalid mapper path: {e}")))?;

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Rep>().await.map_err(|e| {
                NKeyMapperError::Transport(format!("unreadable mapper reply: {e}"))
            });
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => Err(body.into()),
            Err(_) => Err(NKeyMapperError::Transport(format!(
                "mapper answered with status {status}"
            ))),
        }
    }
}

fn transport_error(e: &reqwest::Error) -> NKeyMapperError {
    if e.is_timeout() {
        NKeyMapperError::Transport("mapper request timed out".to_owned())
    } else {
        NKeyMapperError::Transport(format!("mapper request failed: {e}"))
    }
}

#[async_trait]
impl NKeyMapperClient for HttpMapperClient {
    async fn kerberos_auth(
        &self,
        request: KerberosAuthRequest,
    ) -> Result<KerberosAuthReply, NKeyMapperError> {
        self.call(KERBEROS_AUTH_PATH, &request).await
    }

    async fn aws_iam_auth(
        &self,
        request: AwsIamAuthRequest,
    ) -> Result<AwsIamAuthReply, NKeyMapperError> {
        self.call(AWS_IAM_AUTH_PATH, &request).await
    }
}
