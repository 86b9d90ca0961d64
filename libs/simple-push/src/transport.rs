use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::TransportError;
use crate::identity::{ClientIdentity, CredentialProvider};

/// Fully built APNs request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl PushRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw outcome of an HTTP exchange, before interpretation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: Option<u16>,
    pub body: Vec<u8>,
    /// `apns-id` header echoed by APNs
    pub apns_id: Option<String>,
}

/// Trait for the HTTP layer a `PushClient` sends through
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Performs a single POST. Errors are reserved for exchanges that never
    /// produced an HTTP response.
    async fn post(&self, request: PushRequest) -> Result<TransportResponse, TransportError>;
}

pub type DynPushTransport = Arc<dyn PushTransport>;

struct CachedClient {
    identity_id: Option<Uuid>,
    client: reqwest::Client,
}

/// reqwest-backed HTTP/2 transport.
///
/// The underlying client is rebuilt whenever the credential provider hands
/// out a different identity, and reused otherwise.
pub struct HttpTransport {
    credentials: Arc<dyn CredentialProvider>,
    timeout: Duration,
    cached: Mutex<Option<CachedClient>>,
}

impl HttpTransport {
    pub fn new(credentials: Arc<dyn CredentialProvider>, timeout: Duration) -> Self {
        Self {
            credentials,
            timeout,
            cached: Mutex::new(None),
        }
    }

    fn build_client(
        &self,
        identity: Option<&ClientIdentity>,
    ) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder()
            .use_native_tls()
            .timeout(self.timeout);

        if let Some(identity) = identity {
            builder = builder.identity(identity.tls().clone());
        }

        builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))
    }

    fn client(&self) -> Result<reqwest::Client, TransportError> {
        let identity = self.credentials.identity();
        let identity_id = identity.as_ref().map(|identity| identity.id());

        let mut cached = self.cached.lock();
        if let Some(entry) = cached.as_ref() {
            if entry.identity_id == identity_id {
                return Ok(entry.client.clone());
            }
        }

        debug!(identity = ?identity_id, "Building APNs HTTP client");

        let client = self.build_client(identity.as_deref())?;
        *cached = Some(CachedClient {
            identity_id,
            client: client.clone(),
        });

        Ok(client)
    }
}

#[async_trait]
impl PushTransport for HttpTransport {
    async fn post(&self, request: PushRequest) -> Result<TransportResponse, TransportError> {
        let client = self.client()?;

        let mut builder = client.post(&request.url).body(request.body);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let apns_id = response
            .headers()
            .get("apns-id")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status: Some(status),
            body,
            apns_id,
        })
    }
}
