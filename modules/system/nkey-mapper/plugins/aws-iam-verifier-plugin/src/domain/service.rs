//! Service implementation for the AWS IAM identity verifier.

use std::collections::BTreeMap;
use std::time::Duration;

use nkey_mapper_sdk::{NKeyMapperError, VerifiedIdentity, sts};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::sts_response::parse_caller_identity;
use crate::config::AwsIamVerifierConfig;

/// Assertion-replay verifier.
pub struct Service {
    http: reqwest::Client,
    endpoint: Url,
    max_clock_skew: Duration,
}

impl Service {
    /// Create a verifier from plugin configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the endpoint is not a URL or the HTTP client
    /// cannot be built.
    pub fn from_config(cfg: &AwsIamVerifierConfig) -> Result<Self, NKeyMapperError> {
        let endpoint = Url::parse(&cfg.endpoint).map_err(|e| {
            NKeyMapperError::Configuration(format!("invalid STS endpoint '{}': {e}", cfg.endpoint))
        })?;
        Self::new(
            endpoint,
            Duration::from_secs(cfg.request_timeout_secs),
            Duration::from_secs(cfg.max_clock_skew_secs),
        )
    }

    /// Create a verifier replaying against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the HTTP client cannot be built.
    pub fn new(
        endpoint: Url,
        request_timeout: Duration,
        max_clock_skew: Duration,
    ) -> Result<Self, NKeyMapperError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| NKeyMapperError::Configuration(format!("cannot build HTTP client: {e}")))?;
        tracing::info!(%endpoint, ?request_timeout, "aws iam verifier configured");
        Ok(Self {
            http,
            endpoint,
            max_clock_skew,
        })
    }

    /// Replay a signed `GetCallerIdentity` request and return the caller ARN.
    ///
    /// # Errors
    ///
    /// - `AssertionInvalid` for unparseable dates, a signed `x-amz-date`
    ///   header that is missing or differs from `timestamp`, unencodable
    ///   headers or a request STS refuses
    /// - `AssertionExpired` if the date is outside the allowed skew
    /// - `Transport` if STS cannot be reached in time
    /// - `IdentityUnresolved` if the STS answer names no ARN
    #[tracing::instrument(skip_all, fields(amz_date = %timestamp))]
    pub async fn verify_request(
        &self,
        timestamp: &str,
        authorization: &str,
        extra_headers: &BTreeMap<String, Vec<String>>,
    ) -> Result<VerifiedIdentity, NKeyMapperError> {
        check_signed_date(timestamp, extra_headers)?;
        check_timestamp(timestamp, OffsetDateTime::now_utc(), self.max_clock_skew)?;
        let headers = replay_headers(authorization, extra_headers)?;

        debug!(endpoint = %self.endpoint, headers = headers.len(), "replaying GetCallerIdentity");
        let response = self
            .http
            .post(self.endpoint.clone())
            .headers(headers)
            .body(sts::REQUEST_BODY)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "STS refused the signed request");
            return Err(NKeyMapperError::AssertionInvalid(format!(
                "STS refused the signed request with status {status}"
            )));
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let identity = parse_caller_identity(&body)?;
        debug!(arn = %identity.arn, account = ?identity.account, "STS confirmed caller");
        Ok(VerifiedIdentity::new(identity.arn))
    }
}

/// Check that an `X-Amz-Date` value lies within `max_skew` of `now`.
///
/// The bound is inclusive.
///
/// # Errors
///
/// Returns `AssertionInvalid` if the value cannot be parsed and
/// `AssertionExpired` if it is too far from `now` in either direction.
pub fn check_timestamp(
    value: &str,
    now: OffsetDateTime,
    max_skew: Duration,
) -> Result<OffsetDateTime, NKeyMapperError> {
    let at = sts::parse_amz_date(value).map_err(|_| {
        NKeyMapperError::AssertionInvalid(format!("unparseable AMZ date '{value}'"))
    })?;
    if at.unix_timestamp().abs_diff(now.unix_timestamp()) > max_skew.as_secs() {
        return Err(NKeyMapperError::AssertionExpired(
            "AMZ date outside of valid range".to_owned(),
        ));
    }
    Ok(at)
}

/// Header carrying the date STS verifies the signature against.
pub const AMZ_DATE_HEADER: &str = "x-amz-date";

/// Check that the signed headers carry exactly one `x-amz-date` equal to the
/// asserted timestamp, so the skew check applies to the date STS verifies.
///
/// # Errors
///
/// Returns `AssertionInvalid` if the header is absent, repeated or differs
/// from `timestamp`.
pub fn check_signed_date(
    timestamp: &str,
    extra_headers: &BTreeMap<String, Vec<String>>,
) -> Result<(), NKeyMapperError> {
    let mut dates = extra_headers
        .iter()
        .filter(|(name, _)| name.eq_ignore_ascii_case(AMZ_DATE_HEADER))
        .flat_map(|(_, values)| values);

    match (dates.next(), dates.next()) {
        (Some(signed), None) if signed == timestamp => Ok(()),
        (Some(_), None) => Err(NKeyMapperError::AssertionInvalid(
            "signed x-amz-date does not match the asserted date".to_owned(),
        )),
        (None, _) => Err(NKeyMapperError::AssertionInvalid(
            "signed request carries no x-amz-date header".to_owned(),
        )),
        (Some(_), Some(_)) => Err(NKeyMapperError::AssertionInvalid(
            "signed request carries more than one x-amz-date".to_owned(),
        )),
    }
}

/// Headers of the replayed request: the fixed content type, the caller's
/// signed headers and the caller's authorization, in that order.
fn replay_headers(
    authorization: &str,
    extra_headers: &BTreeMap<String, Vec<String>>,
) -> Result<HeaderMap, NKeyMapperError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(sts::REQUEST_CONTENT_TYPE),
    );

    for (name, values) in extra_headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            NKeyMapperError::AssertionInvalid(format!("invalid header name '{name}'"))
        })?;
        if name == AUTHORIZATION || name == CONTENT_TYPE || name == CONTENT_LENGTH {
            continue;
        }
        for value in values {
            let value = HeaderValue::from_str(value).map_err(|_| {
                NKeyMapperError::AssertionInvalid(format!("invalid value for header '{name}'"))
            })?;
            headers.append(name.clone(), value);
        }
    }

    let mut authorization = HeaderValue::from_str(authorization).map_err(|_| {
        NKeyMapperError::AssertionInvalid("invalid authorization header".to_owned())
    })?;
    authorization.set_sensitive(true);
    headers.insert(AUTHORIZATION, authorization);
    Ok(headers)
}

fn transport_error(e: &reqwest::Error) -> NKeyMapperError {
    if e.is_timeout() {
        NKeyMapperError::Transport("STS request timed out".to_owned())
    } else {
        NKeyMapperError::Transport(format!("STS request failed: {e}"))
    }
}
