use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{Endpoint, Priority, PushConfig};
use crate::error::PushError;
use crate::identity::{ClientIdentity, CredentialProvider, IdentityStore, DEFAULT_PASSPHRASE};
use crate::payload::Payload;
use crate::response;
use crate::token::DeviceToken;
use crate::transport::{DynPushTransport, HttpTransport, PushRequest, PushTransport};

/// `apns-push-type` sent with every request
pub const PUSH_TYPE: &str = "alert";

/// Whether a client identity has been loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Unconfigured,
    Configured,
}

/// Per-send overrides; unset fields fall back to the client's `PushConfig`
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub endpoint: Option<Endpoint>,
    pub priority: Option<Priority>,
    pub topic: Option<String>,
}

impl SendOptions {
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.endpoint = Some(Endpoint::from_sandbox_flag(sandbox));
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }
}

/// Successful delivery acknowledgement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReceipt {
    /// `apns-id` assigned by APNs, when echoed back
    pub apns_id: Option<String>,
    pub status: Option<u16>,
}

/// Apple Push Notification Service client.
///
/// Cloning is cheap; clones share the identity slot and the transport, so a
/// `setup` on one clone is visible to all of them.
#[derive(Clone)]
pub struct PushClient {
    config: Arc<PushConfig>,
    identities: Arc<IdentityStore>,
    transport: DynPushTransport,
}

impl PushClient {
    /// Creates an unconfigured client sending over HTTP/2 with reqwest.
    ///
    /// The reqwest client itself is built on first send, once the identity to
    /// present is known.
    pub fn new(config: PushConfig) -> Self {
        let timeout = config.timeout;
        Self::with_transport(config, move |credentials| -> Arc<dyn PushTransport> {
            Arc::new(HttpTransport::new(credentials, timeout))
        })
    }

    /// Creates a client and loads `certificate_path` when one is configured
    pub fn from_config(config: PushConfig) -> Result<Self, PushError> {
        let path = config.certificate_path.clone();
        let passphrase = config
            .certificate_passphrase
            .clone()
            .unwrap_or_else(|| DEFAULT_PASSPHRASE.to_string());

        let client = Self::new(config);
        if let Some(path) = path {
            client.setup_from_file(path, &passphrase)?;
        }

        Ok(client)
    }

    /// Creates a client over a caller-supplied transport.
    ///
    /// `build` receives the provider backed by this client's identity slot, so
    /// identities installed through `setup` reach the transport.
    pub fn with_transport<F>(config: PushConfig, build: F) -> Self
    where
        F: FnOnce(Arc<dyn CredentialProvider>) -> Arc<dyn PushTransport>,
    {
        let identities = Arc::new(IdentityStore::new());
        let credentials: Arc<dyn CredentialProvider> = identities.clone();
        let transport = build(credentials);

        Self {
            config: Arc::new(config),
            identities,
            transport,
        }
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    pub fn state(&self) -> ClientState {
        if self.identities.is_loaded() {
            ClientState::Configured
        } else {
            ClientState::Unconfigured
        }
    }

    /// Id of the loaded identity, if any
    pub fn identity_id(&self) -> Option<Uuid> {
        self.identities.identity().map(|identity| identity.id())
    }

    /// Loads a PKCS#12 bundle exported with the default passphrase.
    ///
    /// On failure the previously loaded identity, if any, stays in place.
    pub fn setup(&self, p12: &[u8]) -> Result<(), PushError> {
        self.setup_with_passphrase(p12, DEFAULT_PASSPHRASE)
    }

    pub fn setup_with_passphrase(&self, p12: &[u8], passphrase: &str) -> Result<(), PushError> {
        let identity = ClientIdentity::from_pkcs12(p12, passphrase).map_err(|e| {
            error!("Failed to import APNs certificate: {}", e);
            e
        })?;

        self.install(identity);
        Ok(())
    }

    pub fn setup_from_file(&self, path: impl AsRef<Path>, passphrase: &str) -> Result<(), PushError> {
        let path = path.as_ref();
        let identity = ClientIdentity::from_file(path, passphrase).map_err(|e| {
            error!(path = %path.display(), "Failed to load APNs certificate: {}", e);
            e
        })?;

        self.install(identity);
        Ok(())
    }

    /// Installs an already decoded identity
    pub fn install(&self, identity: ClientIdentity) {
        let id = identity.id();
        let replaced = self.identities.replace(identity);

        info!(
            identity = %id,
            replaced = replaced.is_some(),
            topic = %self.config.topic,
            "APNs client identity loaded"
        );
    }

    /// Builds the POST request for a single device without sending it
    pub fn build_request(
        &self,
        payload: &Payload,
        token: &DeviceToken,
        options: &SendOptions,
    ) -> Result<PushRequest, PushError> {
        let endpoint = options.endpoint.unwrap_or(self.config.endpoint);
        let priority = options.priority.unwrap_or(self.config.priority);
        let topic = options
            .topic
            .clone()
            .unwrap_or_else(|| self.config.topic.clone());

        Ok(PushRequest {
            url: endpoint.device_url(token),
            headers: vec![
                ("apns-priority", priority.as_str().to_string()),
                ("apns-push-type", PUSH_TYPE.to_string()),
                ("apns-topic", topic),
            ],
            body: payload.to_bytes()?,
        })
    }

    /// Sends `payload` to one device.
    ///
    /// Makes exactly one attempt; retry policy is left to the caller.
    pub async fn send(
        &self,
        payload: &Payload,
        token: &DeviceToken,
        options: SendOptions,
    ) -> Result<PushReceipt, PushError> {
        let token_prefix = token.prefix();
        let request = self.build_request(payload, token, &options)?;

        let response = match self.transport.post(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("APNs request failed for token {}: {}", token_prefix, e);
                return Err(e.into());
            }
        };

        match response::interpret(&response) {
            Ok(()) => {
                info!(
                    "APNs notification sent successfully to token {} (apns_id: {:?})",
                    token_prefix, response.apns_id
                );
                Ok(PushReceipt {
                    apns_id: response.apns_id,
                    status: response.status,
                })
            }
            Err(e) => {
                warn!(
                    status = ?response.status,
                    "APNs rejected notification for token {}: {}", token_prefix, e
                );
                Err(e)
            }
        }
    }

    /// Dispatches a send onto the current tokio runtime and returns
    /// immediately.
    ///
    /// `completion` runs exactly once with the outcome. Outside a runtime it
    /// runs inline with `PushError::Runtime` and no task handle is returned.
    pub fn send_with_completion<F>(
        &self,
        payload: Payload,
        token: DeviceToken,
        options: SendOptions,
        completion: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(Result<PushReceipt, PushError>) + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("No tokio runtime for APNs send to token {}: {}", token.prefix(), e);
                completion(Err(PushError::Runtime(e.to_string())));
                return None;
            }
        };

        let client = self.clone();
        Some(handle.spawn(async move {
            let result = client.send(&payload, &token, options).await;
            completion(result);
        }))
    }
}
