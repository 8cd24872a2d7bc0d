//! Challenge adapter bridging the broker's synchronous nonce callback to the
//! asynchronous mapper calls.
//!
//! All mapper traffic runs on a worker runtime owned by the adapter, so a
//! caller blocked in [`ChallengeAdapter::sign_nonce_blocking`] never starves
//! the I/O it is waiting on, whichever runtime the caller itself lives on.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use nkey_mapper_sdk::NKeyMapperError;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::backend::MapperBackend;
use crate::broker::{BrokerConnectOptions, NonceSigner};
use crate::error::ClientError;

/// Handshake progress of one adapter.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientSessionState {
    pub resolved_token: Option<String>,
    pub service_authenticated: bool,
}

impl fmt::Debug for ClientSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSessionState")
            .field("resolved_token", &self.resolved_token.as_ref().map(|_| "<redacted>"))
            .field("service_authenticated", &self.service_authenticated)
            .finish()
    }
}

/// Adapter tuning.
#[derive(Debug, Clone, Copy)]
pub struct AdapterOptions {
    /// How long [`ChallengeAdapter::sign_nonce_blocking`] waits.
    pub sign_timeout: Duration,
    pub worker_threads: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            sign_timeout: Duration::from_secs(30),
            worker_threads: 2,
        }
    }
}

struct Inner<B> {
    backend: tokio::sync::Mutex<B>,
    session: parking_lot::Mutex<ClientSessionState>,
}

impl<B: MapperBackend> Inner<B> {
    async fn ensure_service_proof(&self, backend: &mut B) -> Result<(), ClientError> {
        if backend.is_authenticated_to_service() {
            return Ok(());
        }

        self.session.lock().service_authenticated = false;
        debug!(backend = %backend.backend(), "proving service identity");
        let result = backend.authenticate_to_service().await;
        self.session.lock().service_authenticated = backend.is_authenticated_to_service();
        result
    }

    async fn resolve_token(self: Arc<Self>) -> Result<String, ClientError> {
        trace!("resolving capability token");
        let mut backend = self.backend.lock().await;
        self.ensure_service_proof(&mut backend).await?;

        let cached = self.session.lock().resolved_token.clone();
        if let Some(token) = cached {
            return Ok(token);
        }

        let jwt = backend.authenticate_to_mapper().await?;
        if jwt.is_empty() {
            warn!("mapper resolved an empty capability token");
            return Err(NKeyMapperError::IdentityUnresolved(
                "unable to resolve capability token".to_owned(),
            )
            .into());
        }
        self.session.lock().resolved_token = Some(jwt.clone());
        debug!(jwt_len = jwt.len(), "resolved capability token");
        Ok(jwt)
    }

    async fn sign_nonce(self: Arc<Self>, nonce: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        trace!(nonce_len = nonce.len(), "signing broker nonce");
        let mut backend = self.backend.lock().await;
        self.ensure_service_proof(&mut backend).await?;

        match backend.sign_nonce(&nonce).await {
            Ok(signed) => {
                self.session.lock().resolved_token = Some(signed.jwt);
                debug!(signature_len = signed.signature.len(), "signed broker nonce");
                Ok(signed.signature)
            }
            Err(e) => {
                self.session.lock().resolved_token = None;
                warn!(error = %e, "nonce signing failed");
                Err(e)
            }
        }
    }
}

/// Drives one client's handshake with the mapper.
///
/// Calls on one adapter are serialized; the session state is only written
/// while the backend lock is held.
pub struct ChallengeAdapter<B> {
    inner: Arc<Inner<B>>,
    worker: parking_lot::Mutex<Option<Runtime>>,
    sign_timeout: Duration,
}

impl<B: MapperBackend + 'static> ChallengeAdapter<B> {
    /// Wrap `backend`, starting the adapter's worker runtime.
    ///
    /// # Errors
    ///
    /// Returns `Worker` if the runtime cannot be started.
    pub fn new(backend: B, options: AdapterOptions) -> Result<Self, ClientError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name("nkey-mapper-worker")
            .enable_all()
            .build()
            .map_err(|e| ClientError::Worker(format!("cannot start worker runtime: {e}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                backend: tokio::sync::Mutex::new(backend),
                session: parking_lot::Mutex::new(ClientSessionState::default()),
            }),
            worker: parking_lot::Mutex::new(Some(runtime)),
            sign_timeout: options.sign_timeout,
        })
    }

    fn spawn<F>(&self, task: F) -> Result<JoinHandle<F::Output>, ClientError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.worker
            .lock()
            .as_ref()
            .map(|runtime| runtime.spawn(task))
            .ok_or(ClientError::Closed)
    }

    /// Whether the service proof is currently held. Never performs I/O.
    ///
    /// Asks the backend, so an expired proof reads as `false`; while a call
    /// holds the backend the last recorded state is returned.
    #[must_use]
    pub fn is_authenticated_to_service(&self) -> bool {
        match self.inner.backend.try_lock() {
            Ok(backend) => {
                let proven = backend.is_authenticated_to_service();
                self.inner.session.lock().service_authenticated = proven;
                proven
            }
            Err(_) => self.inner.session.lock().service_authenticated,
        }
    }

    /// Snapshot of the session state.
    #[must_use]
    pub fn session(&self) -> ClientSessionState {
        self.inner.session.lock().clone()
    }

    /// Resolve the capability token, proving service identity first if
    /// needed. A cached token is returned without a mapper call.
    ///
    /// # Errors
    ///
    /// Returns the backend's or mapper's error unchanged; no retry is made.
    pub async fn resolve_token(&self) -> Result<String, ClientError> {
        let task = self.spawn(Arc::clone(&self.inner).resolve_token())?;
        task.await
            .map_err(|e| ClientError::Worker(e.to_string()))?
    }

    /// Have the mapper sign `nonce`.
    ///
    /// The reply's token replaces the cached one; a failure clears it.
    ///
    /// # Errors
    ///
    /// Returns the backend's or mapper's error unchanged; no retry is made.
    pub async fn sign_nonce(&self, nonce: &[u8]) -> Result<Vec<u8>, ClientError> {
        let task = self.spawn(Arc::clone(&self.inner).sign_nonce(nonce.to_vec()))?;
        task.await
            .map_err(|e| ClientError::Worker(e.to_string()))?
    }

    /// Blocking form of [`ChallengeAdapter::sign_nonce`] for the broker's
    /// synchronous challenge callback.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if no answer arrives within the sign timeout,
    /// otherwise the same errors as [`ChallengeAdapter::sign_nonce`].
    pub fn sign_nonce_blocking(&self, nonce: &[u8]) -> Result<Vec<u8>, ClientError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        let nonce = nonce.to_vec();
        self.spawn(async move {
            let result = inner.sign_nonce(nonce).await;
            if tx.send(result).is_err() {
                debug!("nonce signature arrived after the caller gave up");
            }
        })?;

        match rx.recv_timeout(self.sign_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout = ?self.sign_timeout, "nonce signing timed out");
                Err(ClientError::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(ClientError::Worker("signing task aborted".to_owned()))
            }
        }
    }

    /// Resolve the capability token and install it, together with this
    /// adapter as the nonce callback, on the broker's connect options.
    ///
    /// # Errors
    ///
    /// Returns the error of the token resolution.
    pub async fn attach<O: BrokerConnectOptions + ?Sized>(
        self: &Arc<Self>,
        options: &mut O,
    ) -> Result<(), ClientError> {
        let jwt = self.resolve_token().await?;
        let signer: Arc<dyn NonceSigner> = self.clone();
        options.set_nkey(jwt, signer);
        Ok(())
    }

    /// Stop the worker runtime. Later calls fail with `Closed`.
    pub fn close(&self) {
        if let Some(runtime) = self.worker.lock().take() {
            runtime.shutdown_background();
            debug!("mapper client closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.worker.lock().is_none()
    }
}

impl<B: MapperBackend + 'static> NonceSigner for ChallengeAdapter<B> {
    fn sign_nonce(&self, nonce: &[u8]) -> Result<Vec<u8>, ClientError> {
        self.sign_nonce_blocking(nonce)
    }
}

impl<B> Drop for ChallengeAdapter<B> {
    fn drop(&mut self) {
        if let Some(runtime) = self.worker.get_mut().take() {
            runtime.shutdown_background();
        }
    }
}
