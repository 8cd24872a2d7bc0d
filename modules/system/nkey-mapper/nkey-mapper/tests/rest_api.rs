#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests of the mapper router with stub verifiers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use nkey_mapper::{MappingTable, MappingTableConfig, NKeyMapperLocalClient, Service, UserMappingConfig};
use nkey_mapper_sdk::{
    AWS_IAM_AUTH_PATH, AwsIamAuthReply, AwsIamAuthRequest, Backend, ErrorBody, IdentityAssertion,
    IdentityVerifierPluginClient, KERBEROS_AUTH_PATH, KerberosAuthReply, KerberosAuthRequest,
    NKeyMapperError, VerifiedIdentity,
};
use nkeys::KeyPair;
use secrecy::SecretString;
use tower::ServiceExt;

/// Kerberos verifier that accepts tokens listed in a lookup table.
struct TokenTableVerifier(HashMap<Vec<u8>, String>);

#[async_trait]
impl IdentityVerifierPluginClient for TokenTableVerifier {
    fn backend(&self) -> Backend {
        Backend::Kerberos
    }

    async fn verify(&self, assertion: &IdentityAssertion) -> Result<VerifiedIdentity, NKeyMapperError> {
        let IdentityAssertion::Kerberos { service_token } = assertion else {
            return Err(NKeyMapperError::AssertionInvalid("not kerberos".to_owned()));
        };
        self.0
            .get(service_token)
            .map(VerifiedIdentity::new)
            .ok_or_else(|| NKeyMapperError::AssertionInvalid("unknown ticket".to_owned()))
    }
}

/// AWS verifier that resolves the access key named in the authorization header.
struct ArnVerifier;

#[async_trait]
impl IdentityVerifierPluginClient for ArnVerifier {
    fn backend(&self) -> Backend {
        Backend::AwsIam
    }

    async fn verify(&self, assertion: &IdentityAssertion) -> Result<VerifiedIdentity, NKeyMapperError> {
        match assertion {
            IdentityAssertion::SignedRequest { timestamp, .. } if timestamp == "19700101T000000Z" => Err(
                NKeyMapperError::AssertionExpired("AMZ date outside of valid range".to_owned()),
            ),
            IdentityAssertion::SignedRequest { authorization, .. } => Ok(VerifiedIdentity::new(format!(
                "arn:aws:iam::123:user/{authorization}"
            ))),
            IdentityAssertion::Kerberos { .. } => Err(NKeyMapperError::AssertionInvalid("not aws".to_owned())),
        }
    }
}

struct Fixture {
    router: axum::Router,
    alice: KeyPair,
    aws_users: KeyPair,
}

fn user(identity: &str, key: &KeyPair, jwt: &str) -> UserMappingConfig {
    UserMappingConfig {
        identity: identity.to_owned(),
        nkey: SecretString::from(key.seed().unwrap()),
        jwt: jwt.to_owned(),
    }
}

fn fixture(with_aws: bool) -> Fixture {
    let alice = KeyPair::new_user();
    let aws_users = KeyPair::new_user();

    let kerberos_table = MappingTable::from_config(&MappingTableConfig {
        users: vec![user("alice@EXAMPLE", &alice, "T")],
    })
    .unwrap();
    let verifier = TokenTableVerifier(HashMap::from([
        (b"alice-ticket".to_vec(), "alice@EXAMPLE".to_owned()),
        (b"bob-ticket".to_vec(), "bob@EXAMPLE".to_owned()),
    ]));

    let mut svc = Service::new().with_backend(Arc::new(verifier), kerberos_table);
    if with_aws {
        let aws_table = MappingTable::from_config(&MappingTableConfig {
            users: vec![user("arn:aws:iam::123:user/*", &aws_users, "T-aws")],
        })
        .unwrap();
        svc = svc.with_backend(Arc::new(ArnVerifier), aws_table);
    }

    let client = Arc::new(NKeyMapperLocalClient::new(Arc::new(svc)));
    Fixture {
        router: nkey_mapper::api::rest::router(client),
        alice,
        aws_users,
    }
}

async fn post(router: &axum::Router, path: &str, body: &impl serde::Serialize) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn kerberos_auth_without_nonce_returns_token() {
    let fx = fixture(false);

    let (status, body) = post(
        &fx.router,
        KERBEROS_AUTH_PATH,
        &KerberosAuthRequest::new(b"alice-ticket".to_vec(), Vec::new()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: KerberosAuthReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.jwt, "T");
    assert!(reply.nonce_signed.is_empty());
    assert_eq!(reply.identity_name, "alice@EXAMPLE");
}

#[tokio::test]
async fn kerberos_auth_signs_nonce() {
    let fx = fixture(false);
    let nonce = b"nonce-from-broker".to_vec();

    let (status, body) = post(
        &fx.router,
        KERBEROS_AUTH_PATH,
        &KerberosAuthRequest::new(b"alice-ticket".to_vec(), nonce.clone()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reply: KerberosAuthReply = serde_json::from_slice(&body).unwrap();
    let public = KeyPair::from_public_key(&fx.alice.public_key()).unwrap();
    assert!(public.verify(&nonce, &reply.nonce_signed).is_ok());
}

#[tokio::test]
async fn unmapped_principal_is_forbidden() {
    let fx = fixture(false);

    let (status, body) = post(
        &fx.router,
        KERBEROS_AUTH_PATH,
        &KerberosAuthRequest::new(b"bob-ticket".to_vec(), b"nonce".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "mapping_not_found");
    assert!(!String::from_utf8_lossy(&body).contains("\"jwt\""));
}

#[tokio::test]
async fn invalid_ticket_is_unauthorized() {
    let fx = fixture(false);

    let (status, body) = post(
        &fx.router,
        KERBEROS_AUTH_PATH,
        &KerberosAuthRequest::new(b"forged".to_vec(), Vec::new()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "assertion_invalid");
}

#[tokio::test]
async fn aws_wildcard_mapping_resolves_any_user_under_prefix() {
    let fx = fixture(true);
    let nonce = b"n".to_vec();

    let request = AwsIamAuthRequest {
        sts_amz_iso8601_date: "20240102T030405Z".to_owned(),
        sts_authorization: "bob".to_owned(),
        sts_additional_headers: std::collections::BTreeMap::new(),
        nonce: nonce.clone(),
    };
    let (status, body) = post(&fx.router, AWS_IAM_AUTH_PATH, &request).await;

    assert_eq!(status, StatusCode::OK);
    let reply: AwsIamAuthReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.jwt, "T-aws");
    assert_eq!(reply.identity_arn, "arn:aws:iam::123:user/bob");
    let public = KeyPair::from_public_key(&fx.aws_users.public_key()).unwrap();
    assert!(public.verify(&nonce, &reply.nonce_signed).is_ok());
}

#[tokio::test]
async fn expired_aws_assertion_is_unauthorized() {
    let fx = fixture(true);

    let request = AwsIamAuthRequest {
        sts_amz_iso8601_date: "19700101T000000Z".to_owned(),
        sts_authorization: "bob".to_owned(),
        ..AwsIamAuthRequest::default()
    };
    let (status, body) = post(&fx.router, AWS_IAM_AUTH_PATH, &request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "assertion_expired");
}

#[tokio::test]
async fn unconfigured_backend_is_configuration_error() {
    let fx = fixture(false);

    let request = AwsIamAuthRequest {
        sts_amz_iso8601_date: "20240102T030405Z".to_owned(),
        sts_authorization: "bob".to_owned(),
        ..AwsIamAuthRequest::default()
    };
    let (status, body) = post(&fx.router, AWS_IAM_AUTH_PATH, &request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "configuration_error");
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let fx = fixture(false);

    let (status, body) = post(
        &fx.router,
        KERBEROS_AUTH_PATH,
        &serde_json::json!({ "serviceToken": "%%% not base64 %%%" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.code, "assertion_invalid");
}

#[tokio::test]
async fn repeated_requests_return_identical_tokens() {
    let fx = fixture(false);
    let request = KerberosAuthRequest::new(b"alice-ticket".to_vec(), Vec::new());

    let (_, first) = post(&fx.router, KERBEROS_AUTH_PATH, &request).await;
    let (_, second) = post(&fx.router, KERBEROS_AUTH_PATH, &request).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn health_endpoint_answers() {
    let fx = fixture(false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = fx.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
