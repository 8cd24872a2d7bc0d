//! Domain and wire models for the `NKey` mapper.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity backend served by a mapper endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Kerberos,
    AwsIam,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kerberos => f.write_str("kerberos"),
            Self::AwsIam => f.write_str("aws_iam"),
        }
    }
}

/// Backend-specific proof of identity supplied by a caller.
///
/// Both variants are replayable within their validity window, so `Debug`
/// only reports their shape.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentityAssertion {
    /// Raw Kerberos application-request (AP-REQ) bytes.
    Kerberos { service_token: Vec<u8> },
    /// A SigV4-signed `GetCallerIdentity` request, minus its fixed parts.
    SignedRequest {
        /// Request date in `yyyyMMddTHHmmssZ` form.
        timestamp: String,
        /// The `Authorization` header, forwarded verbatim.
        authorization: String,
        /// Every other signed header except `Authorization` and `Content-Type`.
        extra_headers: BTreeMap<String, Vec<String>>,
    },
}

impl IdentityAssertion {
    /// The backend able to verify this assertion.
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            Self::Kerberos { .. } => Backend::Kerberos,
            Self::SignedRequest { .. } => Backend::AwsIam,
        }
    }
}

impl fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kerberos { service_token } => f
                .debug_struct("Kerberos")
                .field("service_token", &format_args!("<{} bytes>", service_token.len()))
                .finish(),
            Self::SignedRequest {
                timestamp,
                authorization,
                extra_headers,
            } => f
                .debug_struct("SignedRequest")
                .field("timestamp", timestamp)
                .field(
                    "authorization",
                    &format_args!("<{} chars>", authorization.len()),
                )
                .field("extra_headers", &extra_headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Canonical identity extracted by a verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Kerberos principal (`name@REALM`) or IAM ARN.
    pub identity: String,
}

impl VerifiedIdentity {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}

/// Result of a successful mapping.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthReply {
    /// Capability token provisioned for the identity.
    pub jwt: String,
    /// Signature over the supplied nonce; empty when no nonce was supplied.
    pub nonce_signed: Vec<u8>,
    /// The identity the assertion resolved to.
    pub identity: String,
}

impl fmt::Debug for AuthReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthReply")
            .field("jwt", &format_args!("<{} chars>", self.jwt.len()))
            .field(
                "nonce_signed",
                &format_args!("<{} bytes>", self.nonce_signed.len()),
            )
            .field("identity", &self.identity)
            .finish()
    }
}

/// `KerberosAuth` request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KerberosAuthRequest {
    #[serde(with = "b64", default)]
    pub service_token: Vec<u8>,
    #[serde(with = "b64", default)]
    pub nonce: Vec<u8>,
}

impl KerberosAuthRequest {
    #[must_use]
    pub fn new(service_token: Vec<u8>, nonce: Vec<u8>) -> Self {
        Self {
            service_token,
            nonce,
        }
    }

    /// Split into the assertion and the nonce.
    #[must_use]
    pub fn into_parts(self) -> (IdentityAssertion, Vec<u8>) {
        (
            IdentityAssertion::Kerberos {
                service_token: self.service_token,
            },
            self.nonce,
        )
    }
}

impl fmt::Debug for KerberosAuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KerberosAuthRequest")
            .field(
                "service_token",
                &format_args!("<{} bytes>", self.service_token.len()),
            )
            .field("nonce", &format_args!("<{} bytes>", self.nonce.len()))
            .finish()
    }
}

/// `KerberosAuth` reply.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KerberosAuthReply {
    pub jwt: String,
    #[serde(with = "b64", default)]
    pub nonce_signed: Vec<u8>,
    pub identity_name: String,
}

impl From<AuthReply> for KerberosAuthReply {
    fn from(reply: AuthReply) -> Self {
        Self {
            jwt: reply.jwt,
            nonce_signed: reply.nonce_signed,
            identity_name: reply.identity,
        }
    }
}

impl fmt::Debug for KerberosAuthReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KerberosAuthReply")
            .field("jwt", &format_args!("<{} chars>", self.jwt.len()))
            .field(
                "nonce_signed",
                &format_args!("<{} bytes>", self.nonce_signed.len()),
            )
            .field("identity_name", &self.identity_name)
            .finish()
    }
}

/// `AwsIamAuth` request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsIamAuthRequest {
    pub sts_amz_iso8601_date: String,
    pub sts_authorization: String,
    #[serde(default)]
    pub sts_additional_headers: BTreeMap<String, Vec<String>>,
    #[serde(with = "b64", default)]
    pub nonce: Vec<u8>,
}

impl AwsIamAuthRequest {
    /// Split into the assertion and the nonce.
    #[must_use]
    pub fn into_parts(self) -> (IdentityAssertion, Vec<u8>) {
        (
            IdentityAssertion::SignedRequest {
                timestamp: self.sts_amz_iso8601_date,
                authorization: self.sts_authorization,
                extra_headers: self.sts_additional_headers,
            },
            self.nonce,
        )
    }
}

impl fmt::Debug for AwsIamAuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsIamAuthRequest")
            .field("sts_amz_iso8601_date", &self.sts_amz_iso8601_date)
            .field(
                "sts_authorization",
                &format_args!("<{} chars>", self.sts_authorization.len()),
            )
            .field(
                "sts_additional_headers",
                &self.sts_additional_headers.keys().collect::<Vec<_>>(),
            )
            .field("nonce", &format_args!("<{} bytes>", self.nonce.len()))
            .finish()
    }
}

/// `AwsIamAuth` reply.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsIamAuthReply {
    pub jwt: String,
    #[serde(with = "b64", default)]
    pub nonce_signed: Vec<u8>,
    pub identity_arn: String,
}

impl From<AuthReply> for AwsIamAuthReply {
    fn from(reply: AuthReply) -> Self {
        Self {
            jwt: reply.jwt,
            nonce_signed: reply.nonce_signed,
            identity_arn: reply.identity,
        }
    }
}

impl fmt::Debug for AwsIamAuthReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsIamAuthReply")
            .field("jwt", &format_args!("<{} chars>", self.jwt.len()))
            .field(
                "nonce_signed",
                &format_args!("<{} bytes>", self.nonce_signed.len()),
            )
            .field("identity_arn", &self.identity_arn)
            .finish()
    }
}

/// Standard base64 for byte fields on the wire.
mod b64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn kerberos_request_uses_wire_field_names() {
        let request = KerberosAuthRequest::new(vec![1, 2, 3], Vec::new());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["serviceToken"], "AQID");
        assert_eq!(json["nonce"], "");
    }

    #[test]
    fn aws_iam_request_accepts_missing_optional_fields() {
        let json = r#"{
            "stsAmzIso8601Date": "20240102T030405Z",
            "stsAuthorization": "AWS4-HMAC-SHA256 Credential=AKID/20240102/us-east-1/sts/aws4_request"
        }"#;

        let request: AwsIamAuthRequest = serde_json::from_str(json).unwrap();
        assert!(request.nonce.is_empty());
        assert!(request.sts_additional_headers.is_empty());

        let (assertion, nonce) = request.into_parts();
        assert_eq!(assertion.backend(), Backend::AwsIam);
        assert!(nonce.is_empty());
    }

    #[test]
    fn aws_iam_reply_uses_wire_field_names() {
        let reply = AwsIamAuthReply::from(AuthReply {
            jwt: "T".to_owned(),
            nonce_signed: vec![0xff],
            identity: "arn:aws:iam::123:user/bob".to_owned(),
        });
        let json = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["jwt"], "T");
        assert_eq!(json["nonceSigned"], "/w==");
        assert_eq!(json["identityArn"], "arn:aws:iam::123:user/bob");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let json = r#"{"serviceToken": "not base64!", "nonce": ""}"#;
        assert!(serde_json::from_str::<KerberosAuthRequest>(json).is_err());
    }

    #[test]
    fn debug_output_hides_credentials() {
        let assertion = IdentityAssertion::SignedRequest {
            timestamp: "20240102T030405Z".to_owned(),
            authorization: "AWS4-HMAC-SHA256 Signature=deadbeef".to_owned(),
            extra_headers: BTreeMap::from([(
                "x-amz-security-token".to_owned(),
                vec!["session-secret".to_owned()],
            )]),
        };
        let rendered = format!("{assertion:?}");
        assert!(!rendered.contains("deadbeef"));
        assert!(!rendered.contains("session-secret"));

        let reply = AuthReply {
            jwt: "eyJhbGciOi.secret.jwt".to_owned(),
            nonce_signed: Vec::new(),
            identity: "alice@EXAMPLE".to_owned(),
        };
        let rendered = format!("{reply:?}");
        assert!(!rendered.contains("secret.jwt"));
        assert!(rendered.contains("alice@EXAMPLE"));
    }
}
