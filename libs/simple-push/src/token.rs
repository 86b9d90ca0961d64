use std::fmt;

use crate::error::PushError;

/// Opaque APNs device token.
///
/// The bytes are not validated; APNs is the authority on whether a token is
/// well formed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DeviceToken(Vec<u8>);

impl DeviceToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parses the hex form apps usually report (either case accepted)
    pub fn from_hex(token: &str) -> Result<Self, PushError> {
        hex::decode(token.trim())
            .map(Self)
            .map_err(|e| PushError::InvalidToken(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex, two digits per byte, as used in the request path
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    /// First 8 hex digits, for logging
    pub fn prefix(&self) -> String {
        self.to_hex().chars().take(8).collect()
    }
}

impl From<Vec<u8>> for DeviceToken {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for DeviceToken {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// Tokens are semi-sensitive; keep them short in debug output.
impl fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceToken({}…)", self.prefix())
    }
}
