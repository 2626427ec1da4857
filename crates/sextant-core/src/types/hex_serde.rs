//! `0x`-prefixed hex encodings for byte fields, used with `#[serde(with = ...)]`.

use serde::{Deserialize, Deserializer, Serializer};

/// Decode a hex string, with or without the `0x` prefix.
pub fn decode_prefixed(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

fn encode_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_fixed<const N: usize, E: serde::de::Error>(s: &str) -> Result<[u8; N], E> {
    let bytes = decode_prefixed(s).map_err(E::custom)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| E::custom(format!("expected {} bytes, got {}", N, bytes.len())))
}

macro_rules! fixed_bytes {
    ($name:ident, $len:expr) => {
        pub mod $name {
            use super::*;

            pub fn serialize<S: Serializer>(v: &[u8; $len], serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&encode_prefixed(v))
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; $len], D::Error> {
                decode_fixed::<$len, _>(&String::deserialize(deserializer)?)
            }
        }
    };
}

fixed_bytes!(root, 32);
fixed_bytes!(bytes4, 4);
fixed_bytes!(bloom, 256);

pub mod roots {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(v: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(v.len()))?;
        for node in v {
            seq.serialize_element(&encode_prefixed(node))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<[u8; 32]>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| decode_fixed::<32, _>(s))
            .collect()
    }
}

pub mod bytes {
    use super::*;

    pub fn serialize<S: Serializer>(v: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_prefixed(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        decode_prefixed(&String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

pub mod bits {
    use super::*;
    use crate::types::beacon::{SyncCommitteeBits, SYNC_COMMITTEE_SIZE};

    pub fn serialize<S: Serializer>(v: &SyncCommitteeBits, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_prefixed(v.as_raw_slice()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SyncCommitteeBits, D::Error> {
        let raw = decode_fixed::<{ SYNC_COMMITTEE_SIZE / 8 }, D::Error>(&String::deserialize(deserializer)?)?;
        Ok(SyncCommitteeBits::new(raw))
    }
}

pub mod root_map {
    use super::*;
    use serde::ser::SerializeMap;
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(v: &BTreeMap<u64, [u8; 32]>, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(v.len()))?;
        for (key, root) in v {
            map.serialize_entry(key, &encode_prefixed(root))?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u64, [u8; 32]>, D::Error> {
        BTreeMap::<u64, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, s)| Ok((key, decode_fixed::<32, D::Error>(&s)?)))
            .collect()
    }
}
