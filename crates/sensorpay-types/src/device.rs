//! Device identity
//!
//! Physical devices are identified by a fixed-length hardware id: exactly 32
//! hexadecimal characters. The id is normalized to lowercase on parse so
//! lookups are case-insensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of a device id in hexadecimal characters
pub const DEVICE_ID_LEN: usize = 32;

/// Errors from parsing a device id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdError {
    #[error("device id must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("device id must be hexadecimal: {id}")]
    NotHexadecimal { id: String },
}

/// Fixed-length hexadecimal hardware identifier for a physical device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Parse and validate a device id
    pub fn parse(s: &str) -> Result<Self, DeviceIdError> {
        if s.len() != DEVICE_ID_LEN {
            return Err(DeviceIdError::InvalidLength {
                expected: DEVICE_ID_LEN,
                actual: s.len(),
            });
        }
        if hex::decode(s).is_err() {
            return Err(DeviceIdError::NotHexadecimal { id: s.to_string() });
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// The raw hexadecimal form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_device_id() {
        let id = DeviceId::parse("00000000000000000000000000000001").unwrap();
        assert_eq!(id.as_str(), "00000000000000000000000000000001");
    }

    #[test]
    fn test_device_id_normalizes_case() {
        let upper = DeviceId::parse("ABCDEF00000000000000000000000001").unwrap();
        let lower = DeviceId::parse("abcdef00000000000000000000000001").unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = DeviceId::parse("abc123").unwrap_err();
        assert!(matches!(err, DeviceIdError::InvalidLength { actual: 6, .. }));
    }

    #[test]
    fn test_non_hex_rejected() {
        let err = DeviceId::parse("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").unwrap_err();
        assert!(matches!(err, DeviceIdError::NotHexadecimal { .. }));
    }
}
