//! Fixed parameters of the `GetCallerIdentity` request.
//!
//! The client signs exactly this request and the mapper replays exactly this
//! request, so both sides must agree on every constant here.

use std::time::Duration;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub const REQUEST_REGION: &str = "us-east-1";
pub const REQUEST_SERVICE: &str = "sts";
pub const REQUEST_ENDPOINT: &str = "https://sts.amazonaws.com";
pub const REQUEST_METHOD: &str = "POST";
pub const REQUEST_BODY: &str = "Action=GetCallerIdentity&Version=2011-06-15";
pub const REQUEST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Maximum distance between the asserted date and the verifier's clock.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(5 * 60);

/// `yyyyMMddTHHmmssZ`, the `X-Amz-Date` format.
const AMZ_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");

/// Render a timestamp as an `X-Amz-Date` value.
///
/// # Errors
///
/// Returns an error if the year does not fit in four digits.
pub fn format_amz_date(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.to_offset(UtcOffset::UTC).format(AMZ_DATE_FORMAT)
}

/// Parse an `X-Amz-Date` value as UTC.
///
/// # Errors
///
/// Returns an error if the value is not in `yyyyMMddTHHmmssZ` form.
pub fn parse_amz_date(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(value, AMZ_DATE_FORMAT).map(PrimitiveDateTime::assume_utc)
}
