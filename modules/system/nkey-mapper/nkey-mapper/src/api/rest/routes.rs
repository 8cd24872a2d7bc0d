use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use nkey_mapper_sdk::{AWS_IAM_AUTH_PATH, KERBEROS_AUTH_PATH, NKeyMapperClient};

use super::handlers;

pub const HEALTH_PATH: &str = "/health";

/// Build the mapper router around any [`NKeyMapperClient`].
#[must_use]
pub fn router(client: Arc<dyn NKeyMapperClient>) -> Router {
    Router::new()
        // POST /nkey-mapper/v1/kerberos-auth
        .route(KERBEROS_AUTH_PATH, post(handlers::kerberos_auth))
        // POST /nkey-mapper/v1/aws-iam-auth
        .route(AWS_IAM_AUTH_PATH, post(handlers::aws_iam_auth))
        .route(HEALTH_PATH, get(|| async { "ok" }))
        .layer(Extension(client))
}
