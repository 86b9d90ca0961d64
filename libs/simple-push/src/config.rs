use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PushError;
use crate::token::DeviceToken;

/// APNs environment a request is delivered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endpoint {
    #[default]
    Production,
    Sandbox,
}

impl Endpoint {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Endpoint::Sandbox
        } else {
            Endpoint::Production
        }
    }

    /// Get APNs API host based on environment
    pub fn host(&self) -> &'static str {
        match self {
            Endpoint::Production => "api.push.apple.com",
            Endpoint::Sandbox => "api.development.push.apple.com",
        }
    }

    pub fn device_url(&self, token: &DeviceToken) -> String {
        format!("https://{}/3/device/{}", self.host(), token.to_hex())
    }
}

/// Value of the `apns-priority` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Immediate delivery
    High,
    /// Delivery may be deferred to save power
    Normal,
    /// Lowest priority; grouped and possibly throttled
    #[default]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "10",
            Priority::Normal => "5",
            Priority::Low => "1",
        }
    }
}

impl FromStr for Priority {
    type Err = PushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "10" => Ok(Priority::High),
            "5" => Ok(Priority::Normal),
            "1" => Ok(Priority::Low),
            other => Err(PushError::Config(format!(
                "invalid apns priority {other:?}: expected 10, 5 or 1"
            ))),
        }
    }
}

/// Push client configuration
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Default `apns-topic`, normally the app bundle identifier
    pub topic: String,
    pub endpoint: Endpoint,
    pub priority: Priority,
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
    pub certificate_path: Option<PathBuf>,
    pub certificate_passphrase: Option<String>,
}

impl PushConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create new push configuration targeting production
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            endpoint: Endpoint::Production,
            priority: Priority::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            certificate_path: None,
            certificate_passphrase: None,
        }
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.endpoint = Endpoint::from_sandbox_flag(sandbox);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    /// Set certificate passphrase
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.certificate_passphrase = Some(passphrase.into());
        self
    }

    /// Load configuration from environment variables
    ///
    /// Required:
    /// - `APNS_TOPIC`: bundle identifier used as the default topic
    ///
    /// Optional:
    /// - `APNS_SANDBOX`: `true` to target the development endpoint (default: false)
    /// - `APNS_PRIORITY`: 10, 5 or 1 (default: 1)
    /// - `APNS_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `APNS_CERTIFICATE_PATH`: PKCS#12 bundle loaded by `PushClient::from_config`
    /// - `APNS_CERTIFICATE_PASSPHRASE`: passphrase for the bundle (default: "1")
    pub fn from_env() -> Result<Self, PushError> {
        let topic = std::env::var("APNS_TOPIC")
            .map_err(|_| PushError::Config("APNS_TOPIC not set".to_string()))?;

        let sandbox = match std::env::var("APNS_SANDBOX") {
            Ok(value) => value.parse::<bool>().map_err(|e| {
                PushError::Config(format!("invalid APNS_SANDBOX {value:?}: {e}"))
            })?,
            Err(_) => false,
        };

        let priority = match std::env::var("APNS_PRIORITY") {
            Ok(value) => value.parse::<Priority>()?,
            Err(_) => Priority::default(),
        };

        let timeout = match std::env::var("APNS_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(value.parse::<u64>().map_err(|e| {
                PushError::Config(format!("invalid APNS_TIMEOUT_SECS {value:?}: {e}"))
            })?),
            Err(_) => Self::DEFAULT_TIMEOUT,
        };

        Ok(Self {
            topic,
            endpoint: Endpoint::from_sandbox_flag(sandbox),
            priority,
            timeout,
            certificate_path: std::env::var("APNS_CERTIFICATE_PATH")
                .ok()
                .map(PathBuf::from),
            certificate_passphrase: std::env::var("APNS_CERTIFICATE_PASSPHRASE").ok(),
        })
    }
}
