use bech32::{FromBase32, ToBase32, Variant};
use ed::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::str::FromStr;

use crate::{Error, Result};

/// Human-readable part of the bech32 form of an address.
pub const ADDRESS_PREFIX: &str = "cosmos";

pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account, operator or consensus address.
#[derive(Encode, Decode, Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    bytes: [u8; ADDRESS_LENGTH],
}

impl Address {
    pub const NULL: Self = Address {
        bytes: [0; ADDRESS_LENGTH],
    };

    pub fn bytes(&self) -> [u8; ADDRESS_LENGTH] {
        self.bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// The consensus address of an ed25519 public key: the first 20 bytes of
    /// its SHA-256 hash.
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        let hash = Sha256::digest(pubkey);
        let mut bytes = [0; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[..ADDRESS_LENGTH]);
        Address { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes = slice
            .try_into()
            .map_err(|_| Error::Address(format!("Expected {} bytes", ADDRESS_LENGTH)))?;
        Ok(Address { bytes })
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address { bytes }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = bech32::encode(ADDRESS_PREFIX, self.bytes.to_base32(), Variant::Bech32)
            .map_err(|_| std::fmt::Error)?;
        write!(f, "{}", encoded)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (hrp, data, variant) =
            bech32::decode(s).map_err(|e| Error::Address(e.to_string()))?;
        if hrp != ADDRESS_PREFIX {
            return Err(Error::Address(format!("Invalid prefix: {}", hrp)));
        }
        if variant != Variant::Bech32 {
            return Err(Error::Address("Invalid variant".to_string()));
        }

        let data = Vec::<u8>::from_base32(&data).map_err(|e| Error::Address(e.to_string()))?;
        Self::from_slice(&data)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bech32_roundtrip() {
        let addr = Address::from([7; ADDRESS_LENGTH]);
        let s = addr.to_string();
        assert!(s.starts_with("cosmos1"));
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn rejects_wrong_prefix() {
        let encoded =
            bech32::encode("osmo", [1u8; ADDRESS_LENGTH].to_base32(), Variant::Bech32).unwrap();
        assert!(encoded.parse::<Address>().is_err());
    }

    #[test]
    fn pubkey_hash() {
        let a = Address::from_pubkey(&[1; 32]);
        let b = Address::from_pubkey(&[2; 32]);
        assert_ne!(a, b);
        assert_eq!(a, Address::from_pubkey(&[1; 32]));
    }

    #[test]
    fn json() {
        let addr = Address::from([3; ADDRESS_LENGTH]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), addr);
    }
}
