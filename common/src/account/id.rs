use std::fmt;

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer as SerdeSerializer};
use thiserror::Error;

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,
    #[error("identifier missing '{0}' separator")]
    MissingSeparator(char),
    #[error("identifier has more than one '{0}' separator")]
    ExtraSeparator(char),
}

/// `account@domain`, spec §3. Serializes as its string form (rather than a
/// derived struct) so it can be used directly as a JSON object key — every
/// `BTreeMap`/`IndexMap` keyed by an id relies on this.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId {
    pub name: String,
    pub domain: DomainId,
}

impl AccountId {
    pub fn new(name: impl Into<String>, domain: DomainId) -> Self {
        Self { name: name.into(), domain }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.domain)
    }
}

impl std::str::FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_once(s, '@').map(|(name, domain)| AccountId {
            name: name.to_string(),
            domain: DomainId(domain.to_string()),
        })
    }
}

impl Serialize for AccountId {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(SerdeError::custom)
    }
}

impl Serializer for AccountId {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(&self.to_string());
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let s = reader.read_string()?;
        s.parse().map_err(|_| ReaderError::InvalidValue)
    }

    fn size(&self) -> usize {
        4 + self.to_string().len()
    }
}

/// `asset#domain`, spec §3.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    pub name: String,
    pub domain: DomainId,
}

impl AssetId {
    pub fn new(name: impl Into<String>, domain: DomainId) -> Self {
        Self { name: name.into(), domain }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.domain)
    }
}

impl std::str::FromStr for AssetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_once(s, '#').map(|(name, domain)| AssetId {
            name: name.to_string(),
            domain: DomainId(domain.to_string()),
        })
    }
}

impl Serialize for AssetId {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(SerdeError::custom)
    }
}

impl Serializer for AssetId {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(&self.to_string());
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let s = reader.read_string()?;
        s.parse().map_err(|_| ReaderError::InvalidValue)
    }

    fn size(&self) -> usize {
        4 + self.to_string().len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub String);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DomainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Serialize for DomainId {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DomainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(String::deserialize(deserializer)?))
    }
}

impl Serializer for DomainId {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self(reader.read_string()?))
    }

    fn size(&self) -> usize {
        4 + self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleId(pub String);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Serialize for RoleId {
    fn serialize<S: SerdeSerializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(String::deserialize(deserializer)?))
    }
}

impl Serializer for RoleId {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(&self.0);
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(Self(reader.read_string()?))
    }

    fn size(&self) -> usize {
        4 + self.0.len()
    }
}

fn split_once(s: &str, sep: char) -> Result<(&str, &str), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty);
    }
    let mut parts = s.splitn(3, sep);
    let name = parts.next().ok_or(IdError::MissingSeparator(sep))?;
    let domain = parts.next().ok_or(IdError::MissingSeparator(sep))?;
    if parts.next().is_some() {
        return Err(IdError::ExtraSeparator(sep));
    }
    if name.is_empty() || domain.is_empty() {
        return Err(IdError::Empty);
    }
    Ok((name, domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_roundtrip() {
        let id: AccountId = "alice@d".parse().unwrap();
        assert_eq!(id.to_string(), "alice@d");
    }

    #[test]
    fn asset_id_roundtrip() {
        let id: AssetId = "coin#d".parse().unwrap();
        assert_eq!(id.to_string(), "coin#d");
    }

    #[test]
    fn account_id_rejects_missing_separator() {
        assert!("alice".parse::<AccountId>().is_err());
    }

    #[test]
    fn account_id_rejects_extra_separator() {
        assert!("alice@d@d2".parse::<AccountId>().is_err());
    }

    #[test]
    fn account_id_wire_roundtrip() {
        let id: AccountId = "alice@d".parse().unwrap();
        assert_eq!(AccountId::from_bytes(&id.to_bytes()).unwrap(), id);
    }

    #[test]
    fn account_id_serializes_as_json_string() {
        let id: AccountId = "alice@d".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice@d\"");
    }
}
