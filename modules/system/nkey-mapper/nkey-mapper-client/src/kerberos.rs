//! Kerberos backend: proves identity with a service ticket for the mapper.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nkey_mapper_sdk::{Backend, KerberosAuthRequest, NKeyMapperClient};
use secrecy::SecretString;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::{MapperBackend, SignedNonce};
use crate::config::KerberosClientConfig;
use crate::error::ClientError;

/// Password credential of a Kerberos account.
#[derive(Debug, Clone)]
pub struct KerberosCredential {
    pub username: String,
    pub password: SecretString,
    pub domain: String,
}

/// AP-REQ for the mapper service, as produced by a Kerberos client.
#[derive(Clone)]
pub struct ServiceTicket {
    pub token: Vec<u8>,
    /// End time of the underlying ticket, when known.
    pub expires_at: Option<OffsetDateTime>,
}

impl fmt::Debug for ServiceTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTicket")
            .field("token", &format_args!("<{} bytes>", self.token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl ServiceTicket {
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        !self.token.is_empty() && self.expires_at.is_none_or(|end| end > now)
    }
}

/// Kerberos client able to log in and request service tickets.
///
/// Supplied by the caller; the adapter never owns the KDC conversation.
#[async_trait]
pub trait KerberosTicketClient: Send + Sync {
    /// Obtain a TGT for `credential`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceProof` if the KDC refuses the credential.
    async fn authenticate(&self, credential: &KerberosCredential) -> Result<(), ClientError>;

    /// Request an AP-REQ for `spn`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceProof` if no ticket can be issued.
    async fn get_service_ticket(
        &self,
        spn: &str,
        mutual_required: bool,
    ) -> Result<ServiceTicket, ClientError>;
}

/// [`MapperBackend`] presenting a Kerberos service ticket.
pub struct KerberosMapperBackend {
    credential: KerberosCredential,
    mapper_service_spn: String,
    tickets: Arc<dyn KerberosTicketClient>,
    mapper: Arc<dyn NKeyMapperClient>,
    ticket: Option<ServiceTicket>,
}

impl KerberosMapperBackend {
    #[must_use]
    pub fn new(
        config: &KerberosClientConfig,
        tickets: Arc<dyn KerberosTicketClient>,
        mapper: Arc<dyn NKeyMapperClient>,
    ) -> Self {
        info!(
            username = %config.username,
            domain = %config.domain,
            spn = %config.mapper_service_spn,
            "kerberos mapper client initialized"
        );
        Self {
            credential: KerberosCredential {
                username: config.username.clone(),
                password: config.password.clone(),
                domain: config.domain.clone(),
            },
            mapper_service_spn: config.mapper_service_spn.clone(),
            tickets,
            mapper,
            ticket: None,
        }
    }

    fn token(&self) -> Result<Vec<u8>, ClientError> {
        self.ticket
            .as_ref()
            .map(|ticket| ticket.token.clone())
            .ok_or(ClientError::NotAuthenticatedToService)
    }
}

#[async_trait]
impl MapperBackend for KerberosMapperBackend {
    fn backend(&self) -> Backend {
        Backend::Kerberos
    }

    fn is_authenticated_to_service(&self) -> bool {
        self.ticket
            .as_ref()
            .is_some_and(|ticket| ticket.is_valid_at(OffsetDateTime::now_utc()))
    }

    async fn authenticate_to_service(&mut self) -> Result<(), ClientError> {
        self.ticket = None;
        self.tickets.authenticate(&self.credential).await?;
        let ticket = self
            .tickets
            .get_service_ticket(&self.mapper_service_spn, true)
            .await?;
        if ticket.token.is_empty() {
            return Err(ClientError::ServiceProof(
                "Kerberos client returned an empty service ticket".to_owned(),
            ));
        }
        debug!(spn = %self.mapper_service_spn, expires_at = ?ticket.expires_at, "obtained service ticket");
        self.ticket = Some(ticket);
        Ok(())
    }

    async fn authenticate_to_mapper(&self) -> Result<String, ClientError> {
        let reply = self
            .mapper
            .kerberos_auth(KerberosAuthRequest::new(self.token()?, Vec::new()))
            .await?;
        debug!(identity = %reply.identity_name, "mapper resolved kerberos identity");
        Ok(reply.jwt)
    }

    async fn sign_nonce(&self, nonce: &[u8]) -> Result<SignedNonce, ClientError> {
        let reply = self
            .mapper
            .kerberos_auth(KerberosAuthRequest::new(self.token()?, nonce.to_vec()))
            .await?;
        Ok(SignedNonce {
            jwt: reply.jwt,
            signature: reply.nonce_signed,
        })
    }
}
