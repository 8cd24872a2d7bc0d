pub mod client;
pub mod service;
pub mod sts_response;
