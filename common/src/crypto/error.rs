use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// This error type provides structured error handling for all crypto module
/// operations, eliminating the need for `.unwrap()` calls that could panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid hash length: {len} bytes, expected: {expected} bytes")]
    InvalidHashLength { len: usize, expected: usize },

    #[error("invalid public key length: {len} bytes, expected: {expected} bytes")]
    InvalidPublicKeyLength { len: usize, expected: usize },

    #[error("invalid signature length: {len} bytes, expected: {expected} bytes")]
    InvalidSignatureLength { len: usize, expected: usize },

    #[error("failed to parse public key")]
    InvalidPublicKey,

    #[error("signature verification failed")]
    VerificationFailed,
}
