use std::{
    fmt::{Display, Formatter},
    io, result,
};

use snafu::Location;

/// Writer-fatal error taxonomy. Every variant except `Encryption` is opaque
/// text; encryption failures keep their kind so callers can distinguish a
/// missing key from a tampered buffer.
#[derive(Debug)]
pub enum Error {
    /// Record does not match the schema: field name, type or cardinality.
    Schema(String),
    /// Value outside the representable range of the chosen encoding.
    Encoding(String),
    /// Compression codec failure. Never retried.
    Compression(String),
    /// Encryption/decryption failure, see [`CryptoError`].
    Encryption(CryptoError),
    /// The underlying stream refused a write. The writer is failed terminally.
    Io(String, Location),
    /// Operation called in the wrong lifecycle state.
    IllegalState(String),
    /// Invariant violation, i.e. a bug.
    Internal(String),
    /// An external error variant
    External(Box<dyn std::error::Error + Send + Sync>),
}

/// Failure kinds of the modular-encryption layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key retriever has no key for the given metadata.
    KeyUnavailable(String),
    /// An AAD prefix was required but not provided, or did not verify.
    AadMismatch(String),
    /// GCM authentication failed. No plaintext is revealed.
    TagMismatch,
    /// The file claims an algorithm this build does not support.
    AlgorithmMismatch(String),
}

pub type Result<T, E = Error> = result::Result<T, E>;

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e.to_string(), Location::default())
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Error {
        Error::Encryption(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Schema(source) => write!(f, "Schema error: {}", source),
            Error::Encoding(source) => write!(f, "Encoding error: {}", source),
            Error::Compression(source) => write!(f, "Compression error: {}", source),
            Error::Encryption(source) => write!(f, "Encryption error: {}", source),
            Error::Io(source, location) => write!(f, "IO error: {} at {}", source, location),
            Error::IllegalState(source) => write!(f, "Illegal state: {}", source),
            Error::Internal(source) => write!(f, "Internal error: {}", source),
            Error::External(source) => write!(f, "External error: {}", source),
        }
    }
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::KeyUnavailable(source) => write!(f, "key unavailable: {}", source),
            CryptoError::AadMismatch(source) => write!(f, "AAD mismatch: {}", source),
            CryptoError::TagMismatch => write!(f, "GCM tag mismatch"),
            CryptoError::AlgorithmMismatch(source) => {
                write!(f, "algorithm mismatch: {}", source)
            }
        }
    }
}
