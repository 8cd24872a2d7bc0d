//! Public API trait for the `NKey` mapper.
//!
//! One RPC per identity backend. Both return the mapped capability token and,
//! when the request carried a broker nonce, the nonce signed with the mapped
//! `NKey` seed.

use async_trait::async_trait;

use crate::error::NKeyMapperError;
use crate::models::{AwsIamAuthReply, AwsIamAuthRequest, KerberosAuthReply, KerberosAuthRequest};

/// HTTP route serving [`NKeyMapperClient::kerberos_auth`].
pub const KERBEROS_AUTH_PATH: &str = "/nkey-mapper/v1/kerberos-auth";

/// HTTP route serving [`NKeyMapperClient::aws_iam_auth`].
pub const AWS_IAM_AUTH_PATH: &str = "/nkey-mapper/v1/aws-iam-auth";

/// Public API trait for the `NKey` mapper.
///
/// Implemented in-process by the mapper module and over HTTP by the client
/// crate, so the challenge adapter does not care where the mapper runs.
///
/// ```ignore
/// let reply = mapper.aws_iam_auth(request).await?;
/// assert_eq!(reply.nonce_signed.is_empty(), request_nonce.is_empty());
/// ```
#[async_trait]
pub trait NKeyMapperClient: Send + Sync {
    /// Verify a Kerberos service ticket and return the mapped credentials.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the Kerberos backend is not configured
    /// - `AssertionInvalid` / `AssertionExpired` if the ticket does not verify
    /// - `IdentityUnresolved` if the ticket carries no usable principal
    /// - `MappingNotFound` if the principal is not provisioned
    async fn kerberos_auth(
        &self,
        request: KerberosAuthRequest,
    ) -> Result<KerberosAuthReply, NKeyMapperError>;

    /// Verify a signed `GetCallerIdentity` request and return the mapped credentials.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the AWS IAM backend is not configured
    /// - `AssertionExpired` if the request date is outside the accepted window
    /// - `AssertionInvalid` if the authority rejects the replayed request
    /// - `IdentityUnresolved` if the authority response carries no ARN
    /// - `MappingNotFound` if the ARN is not provisioned
    /// - `Transport` if the authority cannot be reached in time
    async fn aws_iam_auth(
        &self,
        request: AwsIamAuthRequest,
    ) -> Result<AwsIamAuthReply, NKeyMapperError>;
}
