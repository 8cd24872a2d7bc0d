//! `GetCallerIdentity` response parsing.

use nkey_mapper_sdk::NKeyMapperError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityResponse {
    get_caller_identity_result: Option<GetCallerIdentityResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCallerIdentityResult {
    arn: Option<String>,
    account: Option<String>,
    user_id: Option<String>,
}

/// Identity reported by STS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub arn: String,
    pub account: Option<String>,
    pub user_id: Option<String>,
}

/// Extract the caller identity from a `GetCallerIdentityResponse` document.
///
/// # Errors
///
/// Returns `IdentityUnresolved` if the document cannot be parsed or carries
/// no ARN.
pub fn parse_caller_identity(xml: &str) -> Result<CallerIdentity, NKeyMapperError> {
    let response: GetCallerIdentityResponse = quick_xml::de::from_str(xml).map_err(|e| {
        NKeyMapperError::IdentityUnresolved(format!("unreadable STS response: {e}"))
    })?;

    let result = response.get_caller_identity_result.ok_or_else(|| {
        NKeyMapperError::IdentityUnresolved("STS response has no GetCallerIdentityResult".to_owned())
    })?;

    match result.arn {
        Some(arn) if !arn.trim().is_empty() => Ok(CallerIdentity {
            arn: arn.trim().to_owned(),
            account: result.account,
            user_id: result.user_id,
        }),
        _ => Err(NKeyMapperError::IdentityUnresolved(
            "STS response has no caller ARN".to_owned(),
        )),
    }
}
