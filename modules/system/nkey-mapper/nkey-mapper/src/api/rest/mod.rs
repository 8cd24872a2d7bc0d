//! REST transport for the `NKey` mapper.
//!
//! Request and reply bodies are the SDK models serialized as JSON with
//! base64-encoded byte fields. Failures are answered with an `ErrorBody`.

pub mod error;
pub mod handlers;
pub mod routes;

pub use routes::router;
