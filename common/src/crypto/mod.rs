pub mod error;
pub mod hash;
pub mod signature;

pub use error::CryptoError;
pub use hash::*;
pub use signature::{KeyPair, PublicKey, Signature, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, SIGNATURE_SIZE};
