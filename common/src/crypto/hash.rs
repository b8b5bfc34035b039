use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    hash::Hasher,
    str::FromStr,
};

use blake3::hash as blake3_hash;
use serde::{de::Error as SerdeError, Deserialize, Serialize};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const HASH_SIZE: usize = 32;

/// A 32-byte BLAKE3 digest. Used as the content identity of transactions,
/// batches (over their reduced hashes) and blocks (over their header).
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    pub const fn zero() -> Self {
        Hash::new([0; HASH_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "invalid hex string")?;
        let bytes: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| "invalid hash length")?;
        Ok(Hash::new(bytes))
    }
}

/// Hash a byte array using BLAKE3.
#[inline(always)]
pub fn hash(value: &[u8]) -> Hash {
    let result: [u8; HASH_SIZE] = blake3_hash(value).into();
    Hash(result)
}

/// Hash the concatenation of several hashes in order, used to derive a
/// batch's identity from its transactions' reduced hashes.
pub fn hash_all<'a>(values: impl Iterator<Item = &'a Hash>) -> Hash {
    let mut buffer = Vec::new();
    for value in values {
        buffer.extend_from_slice(value.as_bytes());
    }
    hash(&buffer)
}

impl Serializer for Hash {
    fn write(&self, writer: &mut Writer) {
        writer.write_hash(self);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_hash()
    }

    fn size(&self) -> usize {
        HASH_SIZE
    }
}

impl std::hash::Hash for Hash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != HASH_SIZE * 2 {
            return Err(SerdeError::custom("invalid hex length for Hash"));
        }
        let decoded = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; HASH_SIZE] = decoded
            .try_into()
            .map_err(|_| SerdeError::custom("could not decode Hash bytes"))?;
        Ok(Hash::new(bytes))
    }
}

/// Implemented by wire types whose content hash is BLAKE3 over their
/// `Serializer` encoding.
pub trait Hashable: Serializer {
    #[inline(always)]
    fn hash(&self) -> Hash {
        hash(&self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_hex_roundtrip() {
        let h = hash(b"hello world");
        let hex = h.to_hex();
        assert_eq!(Hash::from_str(&hex).unwrap(), h);
    }

    #[test]
    fn hash_all_is_order_sensitive() {
        let a = hash(b"a");
        let b = hash(b"b");
        assert_ne!(hash_all([&a, &b].into_iter()), hash_all([&b, &a].into_iter()));
    }
}
