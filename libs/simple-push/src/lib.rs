//! SimplePush
//!
//! A small Apple Push Notification Service (APNs) client that delivers a single
//! notification per call over HTTP/2, authenticated with a PKCS#12 client
//! certificate.
//!
//! It handles:
//! - Payload construction under the `aps` dictionary
//! - Certificate (PKCS#12 / PEM) loading and hot replacement
//! - Request construction against the production or sandbox endpoint
//! - Response interpretation into typed errors
//!
//! ```rust,no_run
//! use simple_push::{DeviceToken, Payload, PushClient, PushConfig, SendOptions};
//!
//! # async fn example() -> simple_push::Result<()> {
//! let client = PushClient::new(PushConfig::new("com.example.app"));
//! client.setup(&std::fs::read("apns_cert.p12").unwrap_or_default())?;
//!
//! let token = DeviceToken::from_hex("ab01")?;
//! client
//!     .send(&Payload::default_alert(), &token, SendOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod payload;
pub mod response;
pub mod token;
pub mod transport;

pub use client::{ClientState, PushClient, PushReceipt, SendOptions};
pub use config::{Endpoint, Priority, PushConfig};
pub use error::{PushError, Result, TransportError};
pub use identity::{ClientIdentity, CredentialProvider, IdentityStore, DEFAULT_PASSPHRASE};
pub use payload::{Payload, PayloadFields};
pub use response::{Reason, ServerError};
pub use token::DeviceToken;
pub use transport::{HttpTransport, PushRequest, PushTransport, TransportResponse};
