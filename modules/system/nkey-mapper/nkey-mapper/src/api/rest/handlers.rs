use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use nkey_mapper_sdk::{
    AwsIamAuthReply, AwsIamAuthRequest, KerberosAuthReply, KerberosAuthRequest, NKeyMapperClient,
    NKeyMapperError,
};
use tracing::field::Empty;

use super::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError(NKeyMapperError::AssertionInvalid(e.body_text())))
}

/// Map a Kerberos service ticket to its `NKey` credentials.
#[tracing::instrument(skip_all, fields(identity = Empty))]
pub async fn kerberos_auth(
    Extension(client): Extension<Arc<dyn NKeyMapperClient>>,
    payload: Result<Json<KerberosAuthRequest>, JsonRejection>,
) -> ApiResult<KerberosAuthReply> {
    let reply = client.kerberos_auth(body(payload)?).await?;
    tracing::Span::current().record("identity", reply.identity_name.as_str());
    Ok(Json(reply))
}

/// Map a signed `GetCallerIdentity` request to its `NKey` credentials.
#[tracing::instrument(skip_all, fields(identity = Empty))]
pub async fn aws_iam_auth(
    Extension(client): Extension<Arc<dyn NKeyMapperClient>>,
    payload: Result<Json<AwsIamAuthRequest>, JsonRejection>,
) -> ApiResult<AwsIamAuthReply> {
    let reply = client.aws_iam_auth(body(payload)?).await?;
    tracing::Span::current().record("identity", reply.identity_arn.as_str());
    Ok(Json(reply))
}
