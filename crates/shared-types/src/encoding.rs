//! # Canonical Encoding
//!
//! `bincode` (fixed-width little-endian integers, length-prefixed sequences)
//! in struct declaration order. Every digest in the system is taken over
//! these bytes.

use crate::errors::EncodingError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical bytes of a value for hashing.
///
/// The shared entities derive `Serialize` and contain no maps or custom
/// serializers that can fail, so serialization is total for them.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).unwrap_or_default()
}

/// Encode a value for storage.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    bincode::serialize(value).map_err(|e| EncodingError::Encode(e.to_string()))
}

/// Decode a value from storage.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EncodingError> {
    bincode::deserialize(bytes).map_err(|e| EncodingError::Decode(e.to_string()))
}

/// Encoded size in bytes; saturates at `usize::MAX` if unmeasurable.
pub fn encoded_size<T: Serialize>(value: &T) -> usize {
    bincode::serialized_size(value)
        .ok()
        .and_then(|size| usize::try_from(size).ok())
        .unwrap_or(usize::MAX)
}
