#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Kerberos Identity Verifier Plugin
//!
//! Verifies Kerberos application requests (AP-REQ) presented to the `NKey`
//! mapper. The ticket is decrypted with the long-term key of the mapper's
//! service account, derived from its password, realm and service principal
//! name, so no KDC round trip is needed.
//!
//! ## Configuration
//!
//! ```yaml
//! kerberos:
//!   verifier:
//!     spn: "HTTP/nkey-mapper.example.com"
//!     realm: "EXAMPLE.COM"
//!     password: "service-account-password"
//!     clock_skew_secs: 300
//! ```

pub mod config;
pub mod domain;

pub use config::KerberosVerifierConfig;
pub use domain::decoder::{DecodedTicket, SharedKeyTicketDecoder, TicketDecoder};
pub use domain::service::Service;
