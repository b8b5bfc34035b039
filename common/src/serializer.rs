//! Binary wire encoding shared by every on-chain type.
//!
//! Every wire-identity type (transactions, commands, blocks, hashes, ...)
//! implements `Serializer` instead of relying solely on `serde`: the byte
//! layout produced by `write` is what gets hashed (see `crypto::Hashable`)
//! and persisted, while `serde` is kept only for JSON-facing query
//! responses and config files.

use std::collections::VecDeque;

use thiserror::Error;

use crate::{context::Context, crypto::Hash};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ReaderError {
    #[error("not enough bytes left to read")]
    ErrorTryInto,
    #[error("invalid size for value")]
    InvalidSize,
    #[error("invalid value")]
    InvalidValue,
}

/// Append-only byte buffer builder used by every `Serializer::write`.
pub struct Writer<'a> {
    bytes: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    pub fn new(bytes: &'a mut Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn write_hash(&mut self, hash: &Hash) {
        self.bytes.extend_from_slice(hash.as_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Write a length-prefixed (u32) byte slice.
    pub fn write_bytes_sized(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.write_bytes(bytes);
    }

    /// Write a length-prefixed (u32) UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes_sized(value.as_bytes());
    }
}

/// Cursor over an in-memory byte buffer used by every `Serializer::read`.
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
    context: Context,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            context: Context::new(),
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn total_size(&self) -> usize {
        self.bytes.len()
    }

    pub fn total_read(&self) -> usize {
        self.offset
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ReaderError> {
        if self.offset + count > self.bytes.len() {
            return Err(ReaderError::ErrorTryInto);
        }
        let slice = &self.bytes[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReaderError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReaderError> {
        let bytes: [u8; 2] = self.take(2)?.try_into().map_err(|_| ReaderError::ErrorTryInto)?;
        Ok(u16::from_be_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, ReaderError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| ReaderError::ErrorTryInto)?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64, ReaderError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| ReaderError::ErrorTryInto)?;
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn read_bool(&mut self) -> Result<bool, ReaderError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReaderError::InvalidValue),
        }
    }

    pub fn read_hash(&mut self) -> Result<Hash, ReaderError> {
        let bytes: [u8; crate::crypto::HASH_SIZE] = self
            .take(crate::crypto::HASH_SIZE)?
            .try_into()
            .map_err(|_| ReaderError::ErrorTryInto)?;
        Ok(Hash::new(bytes))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ReaderError> {
        Ok(self.take(count)?.to_vec())
    }

    pub fn read_bytes_sized(&mut self) -> Result<Vec<u8>, ReaderError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    pub fn read_string(&mut self) -> Result<String, ReaderError> {
        let bytes = self.read_bytes_sized()?;
        String::from_utf8(bytes).map_err(|_| ReaderError::InvalidValue)
    }
}

/// Binary wire encoding: `write`/`read` must round-trip and `size` must
/// equal the exact number of bytes `write` produces.
pub trait Serializer: Sized {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>;

    fn size(&self) -> usize;

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        let mut writer = Writer::new(&mut bytes);
        self.write(&mut writer);
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ReaderError> {
        let mut reader = Reader::new(bytes);
        Self::read(&mut reader)
    }

    fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl Serializer for u8 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u8(*self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u8()
    }
    fn size(&self) -> usize {
        1
    }
}

impl Serializer for u16 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u16(*self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u16()
    }
    fn size(&self) -> usize {
        2
    }
}

impl Serializer for u32 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(*self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u32()
    }
    fn size(&self) -> usize {
        4
    }
}

impl Serializer for u64 {
    fn write(&self, writer: &mut Writer) {
        writer.write_u64(*self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_u64()
    }
    fn size(&self) -> usize {
        8
    }
}

impl Serializer for bool {
    fn write(&self, writer: &mut Writer) {
        writer.write_bool(*self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_bool()
    }
    fn size(&self) -> usize {
        1
    }
}

impl Serializer for String {
    fn write(&self, writer: &mut Writer) {
        writer.write_string(self);
    }
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_string()
    }
    fn size(&self) -> usize {
        4 + self.len()
    }
}

impl<T: Serializer> Serializer for Option<T> {
    fn write(&self, writer: &mut Writer) {
        match self {
            Some(value) => {
                writer.write_bool(true);
                value.write(writer);
            }
            None => writer.write_bool(false),
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        if reader.read_bool()? {
            Ok(Some(T::read(reader)?))
        } else {
            Ok(None)
        }
    }

    fn size(&self) -> usize {
        1 + self.as_ref().map(Serializer::size).unwrap_or(0)
    }
}

impl<T: Serializer> Serializer for Vec<T> {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.len() as u32);
        for item in self {
            item.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let len = reader.read_u32()? as usize;
        let mut items = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            items.push(T::read(reader)?);
        }
        Ok(items)
    }

    fn size(&self) -> usize {
        4 + self.iter().map(Serializer::size).sum::<usize>()
    }
}

impl<T: Serializer> Serializer for VecDeque<T> {
    fn write(&self, writer: &mut Writer) {
        writer.write_u32(self.len() as u32);
        for item in self {
            item.write(writer);
        }
    }

    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let len = reader.read_u32()? as usize;
        let mut items = VecDeque::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            items.push_back(T::read(reader)?);
        }
        Ok(items)
    }

    fn size(&self) -> usize {
        4 + self.iter().map(Serializer::size).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_primitives() {
        assert_eq!(u64::from_bytes(&42u64.to_bytes()).unwrap(), 42u64);
        assert_eq!(
            String::from_bytes(&"hello".to_string().to_bytes()).unwrap(),
            "hello".to_string()
        );
        assert_eq!(
            Vec::<u8>::from_bytes(&vec![1u8, 2, 3].to_bytes()).unwrap(),
            vec![1u8, 2, 3]
        );
    }

    #[test]
    fn roundtrip_option() {
        let some: Option<u32> = Some(7);
        let none: Option<u32> = None;
        assert_eq!(Option::<u32>::from_bytes(&some.to_bytes()).unwrap(), some);
        assert_eq!(Option::<u32>::from_bytes(&none.to_bytes()).unwrap(), none);
    }

    #[test]
    fn truncated_input_errors() {
        assert_eq!(u64::from_bytes(&[0u8; 4]), Err(ReaderError::ErrorTryInto));
    }
}
