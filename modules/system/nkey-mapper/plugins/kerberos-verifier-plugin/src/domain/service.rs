//! Service implementation for the Kerberos identity verifier.

use std::time::Duration;

use nkey_mapper_sdk::{NKeyMapperError, VerifiedIdentity};
use secrecy::ExposeSecret;
use time::OffsetDateTime;

use super::decoder::{DecodedTicket, SharedKeyTicketDecoder, TicketDecoder};
use crate::config::KerberosVerifierConfig;

/// Kerberos identity verifier.
pub struct Service {
    decoder: Box<dyn TicketDecoder>,
    clock_skew: Duration,
}

impl Service {
    /// Create a verifier from the service account configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the SPN, realm or password is missing.
    pub fn from_config(cfg: &KerberosVerifierConfig) -> Result<Self, NKeyMapperError> {
        let missing: Vec<&str> = [
            ("spn", cfg.spn.trim().is_empty()),
            ("realm", cfg.realm.trim().is_empty()),
            ("password", cfg.password.expose_secret().is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(NKeyMapperError::Configuration(format!(
                "missing Kerberos configuration: {}",
                missing.join(", ")
            )));
        }

        tracing::info!(spn = %cfg.spn, realm = %cfg.realm, "kerberos verifier configured");
        let decoder = SharedKeyTicketDecoder::new(&cfg.spn, &cfg.realm, &cfg.password);
        Ok(Self::with_decoder(
            Box::new(decoder),
            Duration::from_secs(cfg.clock_skew_secs),
        ))
    }

    /// Create a verifier around an arbitrary decoder.
    #[must_use]
    pub fn with_decoder(decoder: Box<dyn TicketDecoder>, clock_skew: Duration) -> Self {
        Self {
            decoder,
            clock_skew,
        }
    }

    /// Verify an AP-REQ and return the client principal.
    ///
    /// # Errors
    ///
    /// - `AssertionInvalid` for empty, malformed or undecryptable tokens
    /// - `AssertionExpired` for expired tickets or stale authenticators
    /// - `IdentityUnresolved` if the ticket carries no client name
    pub fn verify_token(&self, token: &[u8]) -> Result<VerifiedIdentity, NKeyMapperError> {
        self.verify_token_at(token, OffsetDateTime::now_utc())
    }

    fn verify_token_at(
        &self,
        token: &[u8],
        now: OffsetDateTime,
    ) -> Result<VerifiedIdentity, NKeyMapperError> {
        if token.is_empty() {
            return Err(NKeyMapperError::AssertionInvalid(
                "invalid or missing Kerberos authentication token".to_owned(),
            ));
        }

        let ticket = self
            .decoder
            .decode(token)
            .map_err(|e| NKeyMapperError::AssertionInvalid(e.to_string()))?;

        if ticket.authenticator_name != ticket.client_name
            || ticket.authenticator_realm != ticket.client_realm
        {
            return Err(NKeyMapperError::AssertionInvalid(
                "authenticator does not match ticket client".to_owned(),
            ));
        }

        let now = now.unix_timestamp();
        if ticket.end_time < now {
            return Err(NKeyMapperError::AssertionExpired(
                "Kerberos ticket has expired".to_owned(),
            ));
        }
        if ticket.authenticator_time.abs_diff(now) > self.clock_skew.as_secs() {
            return Err(NKeyMapperError::AssertionExpired(
                "Kerberos authenticator outside of allowed clock skew".to_owned(),
            ));
        }

        principal_name(&ticket).map(VerifiedIdentity::new)
    }
}

/// `name[/instance...]@REALM`
fn principal_name(ticket: &DecodedTicket) -> Result<String, NKeyMapperError> {
    if ticket.client_name.iter().all(String::is_empty) {
        return Err(NKeyMapperError::IdentityUnresolved(
            "Kerberos ticket carries no client name".to_owned(),
        ));
    }
    Ok(format!(
        "{}@{}",
        ticket.client_name.join("/"),
        ticket.client_realm
    ))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::domain::decoder::DecodeError;

    const NOW: i64 = 1_700_000_000;

    /// Decoder returning a fixed ticket for any non-garbage token.
    struct FixedDecoder(DecodedTicket);

    impl TicketDecoder for FixedDecoder {
        fn decode(&self, token: &[u8]) -> Result<DecodedTicket, DecodeError> {
            if token == b"garbage" {
                return Err(DecodeError::Decrypt("ticket"));
            }
            Ok(self.0.clone())
        }
    }

    fn ticket(name: &[&str], realm: &str) -> DecodedTicket {
        let name: Vec<String> = name.iter().map(|s| (*s).to_owned()).collect();
        DecodedTicket {
            client_name: name.clone(),
            client_realm: realm.to_owned(),
            authenticator_name: name,
            authenticator_realm: realm.to_owned(),
            end_time: NOW + 3600,
            authenticator_time: NOW,
        }
    }

    fn service(ticket: DecodedTicket) -> Service {
        Service::with_decoder(Box::new(FixedDecoder(ticket)), Duration::from_secs(300))
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(NOW).unwrap()
    }

    #[test]
    fn valid_ticket_yields_principal() {
        let svc = service(ticket(&["alice"], "EXAMPLE"));
        let identity = svc.verify_token_at(b"ap-req", now()).unwrap();
        assert_eq!(identity.identity, "alice@EXAMPLE");
    }

    #[test]
    fn multi_component_names_are_slash_joined() {
        let svc = service(ticket(&["HTTP", "web.example.com"], "EXAMPLE.COM"));
        let identity = svc.verify_token_at(b"ap-req", now()).unwrap();
        assert_eq!(identity.identity, "HTTP/web.example.com@EXAMPLE.COM");
    }

    #[test]
    fn empty_token_is_invalid() {
        let svc = service(ticket(&["alice"], "EXAMPLE"));
        match svc.verify_token_at(&[], now()) {
            Err(NKeyMapperError::AssertionInvalid(msg)) => {
                assert_eq!(msg, "invalid or missing Kerberos authentication token");
            }
            other => panic!("Expected AssertionInvalid, got: {other:?}"),
        }
    }

    #[test]
    fn undecryptable_token_is_invalid() {
        let svc = service(ticket(&["alice"], "EXAMPLE"));
        assert!(matches!(
            svc.verify_token_at(b"garbage", now()),
            Err(NKeyMapperError::AssertionInvalid(_))
        ));
    }

    #[test]
    fn expired_ticket_is_rejected() {
        let mut t = ticket(&["alice"], "EXAMPLE");
        t.end_time = NOW - 1;
        assert!(matches!(
            service(t).verify_token_at(b"ap-req", now()),
            Err(NKeyMapperError::AssertionExpired(_))
        ));
    }

    #[test]
    fn authenticator_skew_boundary() {
        let mut t = ticket(&["alice"], "EXAMPLE");
        t.authenticator_time = NOW - 300;
        assert!(service(t.clone()).verify_token_at(b"ap-req", now()).is_ok());

        t.authenticator_time = NOW + 301;
        assert!(matches!(
            service(t).verify_token_at(b"ap-req", now()),
            Err(NKeyMapperError::AssertionExpired(_))
        ));
    }

    #[test]
    fn mismatched_authenticator_is_invalid() {
        let mut t = ticket(&["alice"], "EXAMPLE");
        t.authenticator_name = vec!["mallory".to_owned()];
        assert!(matches!(
            service(t).verify_token_at(b"ap-req", now()),
            Err(NKeyMapperError::AssertionInvalid(_))
        ));
    }

    #[test]
    fn nameless_ticket_is_unresolved() {
        let svc = service(ticket(&[], "EXAMPLE"));
        assert!(matches!(
            svc.verify_token_at(b"ap-req", now()),
            Err(NKeyMapperError::IdentityUnresolved(_))
        ));
    }

    #[test]
    fn from_config_reports_every_missing_field() {
        let cfg = KerberosVerifierConfig {
            spn: "HTTP/mapper.example.com".to_owned(),
            ..KerberosVerifierConfig::default()
        };

        match Service::from_config(&cfg) {
            Err(NKeyMapperError::Configuration(msg)) => {
                assert!(msg.contains("realm"));
                assert!(msg.contains("password"));
                assert!(!msg.contains("spn"));
            }
            Err(other) => panic!("Expected Configuration, got: {other:?}"),
            Ok(_) => panic!("Expected Configuration, got a service"),
        }
    }

    #[test]
    fn from_config_accepts_complete_account() {
        let cfg = KerberosVerifierConfig {
            spn: "HTTP/mapper.example.com".to_owned(),
            realm: "EXAMPLE.COM".to_owned(),
            password: SecretString::from("password".to_owned()),
            ..KerberosVerifierConfig::default()
        };
        assert!(Service::from_config(&cfg).is_ok());
    }
}
