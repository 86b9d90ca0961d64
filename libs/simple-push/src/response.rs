//! Interpretation of APNs responses
//!
//! APNs answers a successful push with `200` and an empty body. Failures carry
//! a small JSON document such as `{"reason":"BadDeviceToken"}`; `410` responses
//! additionally include the `timestamp` at which the token became invalid.

use std::fmt;

use serde::Deserialize;

use crate::error::PushError;
use crate::transport::TransportResponse;

/// Failure reasons documented by APNs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    BadCollapseId,
    BadDeviceToken,
    BadExpirationDate,
    BadMessageId,
    BadPriority,
    BadTopic,
    DeviceTokenNotForTopic,
    DuplicateHeaders,
    IdleTimeout,
    InvalidPushType,
    MissingDeviceToken,
    MissingTopic,
    PayloadEmpty,
    TopicDisallowed,
    BadCertificate,
    BadCertificateEnvironment,
    ExpiredProviderToken,
    Forbidden,
    InvalidProviderToken,
    MissingProviderToken,
    BadPath,
    MethodNotAllowed,
    ExpiredToken,
    Unregistered,
    PayloadTooLarge,
    TooManyProviderTokenUpdates,
    TooManyRequests,
    InternalServerError,
    ServiceUnavailable,
    Shutdown,
    Other(String),
}

impl Reason {
    pub fn parse(value: &str) -> Self {
        match value {
            "BadCollapseId" => Reason::BadCollapseId,
            "BadDeviceToken" => Reason::BadDeviceToken,
            "BadExpirationDate" => Reason::BadExpirationDate,
            "BadMessageId" => Reason::BadMessageId,
            "BadPriority" => Reason::BadPriority,
            "BadTopic" => Reason::BadTopic,
            "DeviceTokenNotForTopic" => Reason::DeviceTokenNotForTopic,
            "DuplicateHeaders" => Reason::DuplicateHeaders,
            "IdleTimeout" => Reason::IdleTimeout,
            "InvalidPushType" => Reason::InvalidPushType,
            "MissingDeviceToken" => Reason::MissingDeviceToken,
            "MissingTopic" => Reason::MissingTopic,
            "PayloadEmpty" => Reason::PayloadEmpty,
            "TopicDisallowed" => Reason::TopicDisallowed,
            "BadCertificate" => Reason::BadCertificate,
            "BadCertificateEnvironment" => Reason::BadCertificateEnvironment,
            "ExpiredProviderToken" => Reason::ExpiredProviderToken,
            "Forbidden" => Reason::Forbidden,
            "InvalidProviderToken" => Reason::InvalidProviderToken,
            "MissingProviderToken" => Reason::MissingProviderToken,
            "BadPath" => Reason::BadPath,
            "MethodNotAllowed" => Reason::MethodNotAllowed,
            "ExpiredToken" => Reason::ExpiredToken,
            "Unregistered" => Reason::Unregistered,
            "PayloadTooLarge" => Reason::PayloadTooLarge,
            "TooManyProviderTokenUpdates" => Reason::TooManyProviderTokenUpdates,
            "TooManyRequests" => Reason::TooManyRequests,
            "InternalServerError" => Reason::InternalServerError,
            "ServiceUnavailable" => Reason::ServiceUnavailable,
            "Shutdown" => Reason::Shutdown,
            other => Reason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Reason::BadCollapseId => "BadCollapseId",
            Reason::BadDeviceToken => "BadDeviceToken",
            Reason::BadExpirationDate => "BadExpirationDate",
            Reason::BadMessageId => "BadMessageId",
            Reason::BadPriority => "BadPriority",
            Reason::BadTopic => "BadTopic",
            Reason::DeviceTokenNotForTopic => "DeviceTokenNotForTopic",
            Reason::DuplicateHeaders => "DuplicateHeaders",
            Reason::IdleTimeout => "IdleTimeout",
            Reason::InvalidPushType => "InvalidPushType",
            Reason::MissingDeviceToken => "MissingDeviceToken",
            Reason::MissingTopic => "MissingTopic",
            Reason::PayloadEmpty => "PayloadEmpty",
            Reason::TopicDisallowed => "TopicDisallowed",
            Reason::BadCertificate => "BadCertificate",
            Reason::BadCertificateEnvironment => "BadCertificateEnvironment",
            Reason::ExpiredProviderToken => "ExpiredProviderToken",
            Reason::Forbidden => "Forbidden",
            Reason::InvalidProviderToken => "InvalidProviderToken",
            Reason::MissingProviderToken => "MissingProviderToken",
            Reason::BadPath => "BadPath",
            Reason::MethodNotAllowed => "MethodNotAllowed",
            Reason::ExpiredToken => "ExpiredToken",
            Reason::Unregistered => "Unregistered",
            Reason::PayloadTooLarge => "PayloadTooLarge",
            Reason::TooManyProviderTokenUpdates => "TooManyProviderTokenUpdates",
            Reason::TooManyRequests => "TooManyRequests",
            Reason::InternalServerError => "InternalServerError",
            Reason::ServiceUnavailable => "ServiceUnavailable",
            Reason::Shutdown => "Shutdown",
            Reason::Other(other) => other,
        }
    }

    /// Whether the device token should be dropped by the caller
    pub fn is_token_invalid(&self) -> bool {
        matches!(
            self,
            Reason::BadDeviceToken | Reason::Unregistered | Reason::ExpiredToken
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: String,
    timestamp: Option<u64>,
}

/// Error text returned by APNs in a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Body exactly as received
    pub message: String,
    /// Parsed `reason`, when the body is the usual JSON document
    pub reason: Option<Reason>,
    /// Milliseconds since epoch at which the token stopped being valid (410 only)
    pub timestamp: Option<u64>,
}

impl ServerError {
    pub fn from_body(message: String) -> Self {
        match serde_json::from_str::<ErrorBody>(&message) {
            Ok(body) => Self {
                reason: Some(Reason::parse(&body.reason)),
                timestamp: body.timestamp,
                message,
            },
            Err(_) => Self {
                message,
                reason: None,
                timestamp: None,
            },
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Maps a completed exchange onto a send outcome.
///
/// A non-empty UTF-8 body wins over the status code, then any status other
/// than 200 is a failure. Everything else counts as delivered.
pub fn interpret(response: &TransportResponse) -> Result<(), PushError> {
    if !response.body.is_empty() {
        if let Ok(text) = std::str::from_utf8(&response.body) {
            return Err(PushError::ServerReported(ServerError::from_body(
                text.to_string(),
            )));
        }
    }

    match response.status {
        Some(code) if code != 200 => Err(PushError::Status(code)),
        _ => Ok(()),
    }
}
