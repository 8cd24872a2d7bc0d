//! AP-REQ decoding with the service's long-term key.

use std::collections::HashMap;

use kerberos_asn1::{ApReq, Asn1Object, Authenticator, EncTicketPart};
use kerberos_crypto::new_kerberos_cipher;
use secrecy::{ExposeSecret, SecretString};

/// Key usage of the ticket's encrypted part (RFC 4120 §7.5.1).
const TICKET_KEY_USAGE: i32 = 2;
/// Key usage of the AP-REQ authenticator.
const AUTHENTICATOR_KEY_USAGE: i32 = 11;

const AES256_CTS_HMAC_SHA1_96: i32 = 18;
const AES128_CTS_HMAC_SHA1_96: i32 = 17;
const RC4_HMAC: i32 = 23;
const SUPPORTED_ETYPES: [i32; 3] = [AES256_CTS_HMAC_SHA1_96, AES128_CTS_HMAC_SHA1_96, RC4_HMAC];

/// GSS-API framing tag and the Kerberos v5 mechanism OID.
const GSS_APPLICATION_TAG: u8 = 0x60;
const KRB5_MECH_OID: [u8; 11] = [
    0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x12, 0x01, 0x02, 0x02,
];
const KRB5_AP_REQ_TOK_ID: [u8; 2] = [0x01, 0x00];

/// Why a token could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed Kerberos token: {0}")]
    Malformed(String),
    #[error("unsupported encryption type {0}")]
    UnsupportedEtype(i32),
    #[error("could not decrypt {0}")]
    Decrypt(&'static str),
}

/// The fields of a decrypted AP-REQ needed to establish identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTicket {
    pub client_name: Vec<String>,
    pub client_realm: String,
    pub authenticator_name: Vec<String>,
    pub authenticator_realm: String,
    /// Ticket end time, Unix seconds.
    pub end_time: i64,
    /// Authenticator creation time, Unix seconds.
    pub authenticator_time: i64,
}

/// Decrypts AP-REQ tokens.
pub trait TicketDecoder: Send + Sync {
    /// Decode and decrypt a token.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the token is malformed or was not
    /// encrypted for this service.
    fn decode(&self, token: &[u8]) -> Result<DecodedTicket, DecodeError>;
}

/// Decoder holding the service keys derived from its password.
pub struct SharedKeyTicketDecoder {
    keys: HashMap<i32, Vec<u8>>,
}

impl SharedKeyTicketDecoder {
    /// Derive the service keys for every supported encryption type.
    #[must_use]
    pub fn new(spn: &str, realm: &str, password: &SecretString) -> Self {
        let salt = service_salt(realm, spn);
        let keys = SUPPORTED_ETYPES
            .iter()
            .filter_map(|&etype| {
                let cipher = new_kerberos_cipher(etype).ok()?;
                Some((
                    etype,
                    cipher.generate_key_from_string(password.expose_secret(), &salt),
                ))
            })
            .collect();
        Self { keys }
    }
}

impl TicketDecoder for SharedKeyTicketDecoder {
    fn decode(&self, token: &[u8]) -> Result<DecodedTicket, DecodeError> {
        let raw = strip_gss_framing(token)?;
        let (_, ap_req) = ApReq::parse(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let enc_part = &ap_req.ticket.enc_part;
        let key = self
            .keys
            .get(&enc_part.etype)
            .ok_or(DecodeError::UnsupportedEtype(enc_part.etype))?;
        let ticket = decrypt_part(enc_part.etype, key, TICKET_KEY_USAGE, &enc_part.cipher, "ticket")?;
        let (_, ticket) =
            EncTicketPart::parse(&ticket).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        let auth_part = &ap_req.authenticator;
        let authenticator = decrypt_part(
            auth_part.etype,
            &ticket.key.keyvalue,
            AUTHENTICATOR_KEY_USAGE,
            &auth_part.cipher,
            "authenticator",
        )?;
        let (_, authenticator) = Authenticator::parse(&authenticator)
            .map_err(|e| DecodeError::Malformed(e.to_string()))?;

        Ok(DecodedTicket {
            client_name: ticket.cname.name_string.clone(),
            client_realm: ticket.crealm.clone(),
            authenticator_name: authenticator.cname.name_string.clone(),
            authenticator_realm: authenticator.crealm.clone(),
            end_time: ticket.endtime.timestamp(),
            authenticator_time: authenticator.ctime.timestamp(),
        })
    }
}

fn decrypt_part(
    etype: i32,
    key: &[u8],
    usage: i32,
    cipher_text: &[u8],
    what: &'static str,
) -> Result<Vec<u8>, DecodeError> {
    let cipher = new_kerberos_cipher(etype).map_err(|_| DecodeError::UnsupportedEtype(etype))?;
    cipher
        .decrypt(key, usage, cipher_text)
        .map_err(|_| DecodeError::Decrypt(what))
}

/// Active Directory user salt: the upper-cased realm followed by the
/// principal's name components.
fn service_salt(realm: &str, spn: &str) -> Vec<u8> {
    let principal = spn.split_once('@').map_or(spn, |(name, _)| name);
    let mut salt = realm.to_uppercase();
    salt.extend(principal.split('/'));
    salt.into_bytes()
}

/// Return the AP-REQ inside a GSS-API initial context token, or the token
/// unchanged when it is a bare AP-REQ.
fn strip_gss_framing(token: &[u8]) -> Result<&[u8], DecodeError> {
    let Some((&tag, rest)) = token.split_first() else {
        return Err(DecodeError::Malformed("empty token".to_owned()));
    };
    if tag != GSS_APPLICATION_TAG {
        return Ok(token);
    }

    let (len, rest) = der_length(rest)?;
    let inner = rest
        .get(..len)
        .ok_or_else(|| DecodeError::Malformed("truncated GSS-API token".to_owned()))?;
    let inner = inner
        .strip_prefix(&KRB5_MECH_OID[..])
        .ok_or_else(|| DecodeError::Malformed("not a Kerberos v5 GSS-API token".to_owned()))?;
    inner
        .strip_prefix(&KRB5_AP_REQ_TOK_ID[..])
        .ok_or_else(|| DecodeError::Malformed("GSS-API token is not an AP-REQ".to_owned()))
}

fn der_length(input: &[u8]) -> Result<(usize, &[u8]), DecodeError> {
    let truncated = || DecodeError::Malformed("truncated DER length".to_owned());
    let (&first, rest) = input.split_first().ok_or_else(truncated)?;
    if first & 0x80 == 0 {
        return Ok((usize::from(first), rest));
    }

    let count = usize::from(first & 0x7f);
    if count == 0 || count > std::mem::size_of::<usize>() {
        return Err(DecodeError::Malformed("unsupported DER length".to_owned()));
    }
    let bytes = rest.get(..count).ok_or_else(truncated)?;
    let len = bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
    Ok((len, &rest[count..]))
}
