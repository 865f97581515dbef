//! Protocol version marker type.
//!
//! The payment headers and payloads carry a version tag that is the string
//! `"1"`. [`ProtocolVersion`] serializes as that string and rejects anything
//! else on deserialization, so a payload from an incompatible client fails to
//! decode instead of being half-understood.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The protocol version marker, always `"1"`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProtocolVersion;

impl ProtocolVersion {
    /// The wire value of this protocol version.
    pub const VALUE: &'static str = "1";
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::VALUE)
    }
}

impl AsRef<str> for ProtocolVersion {
    fn as_ref(&self) -> &str {
        Self::VALUE
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::VALUE {
            Ok(Self)
        } else {
            Err(format!("expected version '{}', got '{s}'", Self::VALUE))
        }
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_string_one() {
        assert_eq!(serde_json::to_string(&ProtocolVersion).unwrap(), "\"1\"");
    }

    #[test]
    fn rejects_other_versions() {
        assert!(serde_json::from_str::<ProtocolVersion>("\"2\"").is_err());
        assert!(serde_json::from_str::<ProtocolVersion>("1").is_err());
        assert!(serde_json::from_str::<ProtocolVersion>("\"1\"").is_ok());
    }
}
