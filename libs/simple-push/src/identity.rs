//! Client certificate identities for mutual TLS
//!
//! APNs certificate authentication presents a client certificate during the
//! TLS handshake. Identities are loaded once, wrapped in an `Arc`, and handed
//! to the transport through a [`CredentialProvider`]. Replacing the identity
//! swaps the `Arc`; requests already in flight keep the snapshot they started
//! with.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::PushError;

/// Passphrase the certificate bundles are exported with
pub const DEFAULT_PASSPHRASE: &str = "1";

/// Certificate, private key and chain presented to APNs
#[derive(Clone)]
pub struct ClientIdentity {
    id: Uuid,
    tls: reqwest::Identity,
}

impl ClientIdentity {
    /// Decodes a DER-encoded PKCS#12 bundle.
    pub fn from_pkcs12(der: &[u8], passphrase: &str) -> Result<Self, PushError> {
        let tls = reqwest::Identity::from_pkcs12_der(der, passphrase)
            .map_err(|e| PushError::IdentityLoad(format!("invalid PKCS#12 bundle: {e}")))?;

        Ok(Self {
            id: Uuid::new_v4(),
            tls,
        })
    }

    /// Reads and decodes a PKCS#12 bundle from disk
    pub fn from_file(path: impl AsRef<Path>, passphrase: &str) -> Result<Self, PushError> {
        let path = path.as_ref();
        let der = std::fs::read(path).map_err(|e| {
            PushError::IdentityLoad(format!(
                "failed to read certificate file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_pkcs12(&der, passphrase)
    }

    /// Builds an identity from a PEM certificate chain and PKCS#8 PEM key
    pub fn from_pkcs8_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, PushError> {
        let tls = reqwest::Identity::from_pkcs8_pem(cert_pem, key_pem)
            .map_err(|e| PushError::IdentityLoad(format!("invalid PEM identity: {e}")))?;

        Ok(Self {
            id: Uuid::new_v4(),
            tls,
        })
    }

    /// Unique per load; changes whenever the identity is replaced
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn tls(&self) -> &reqwest::Identity {
        &self.tls
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Supplies the identity for the next TLS handshake.
///
/// `None` means the transport proceeds with its default credential handling,
/// which APNs rejects for certificate-authenticated topics.
pub trait CredentialProvider: Send + Sync {
    fn identity(&self) -> Option<Arc<ClientIdentity>>;
}

/// Shared, replaceable slot holding the current identity
#[derive(Default)]
pub struct IdentityStore {
    current: RwLock<Option<Arc<ClientIdentity>>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `identity`, returning the one it replaced
    pub fn replace(&self, identity: ClientIdentity) -> Option<Arc<ClientIdentity>> {
        self.current.write().replace(Arc::new(identity))
    }

    pub fn clear(&self) -> Option<Arc<ClientIdentity>> {
        self.current.write().take()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

impl CredentialProvider for IdentityStore {
    fn identity(&self) -> Option<Arc<ClientIdentity>> {
        self.current.read().as_ref().cloned()
    }
}
