//! # Shared Crypto - Cryptographic Collaborator
//!
//! The chain core never implements cryptography itself; it calls into this
//! crate at a handful of fixed points (signing digest construction, block
//! signing, confirmation validation, block id accumulation).
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, BLAKE3 | Digests, touch-point hashing |
//! | `ecdsa` | secp256k1 (recoverable) | Block signing, confirmations |
//! | `merkle` | SHA-256 pair hashing | Block id accumulator, tx roots |
//!
//! ## Contract
//!
//! - `sign(private_key, digest) -> signature`
//! - `recover(signature, digest) -> public_key`
//! - `sha256(bytes) -> digest`
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization
//! - Signatures carry the recovery id so the signer key is derivable from
//!   `(signature, digest)` alone

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod merkle;

// Re-exports
pub use ecdsa::{recover, sign, PrivateKey, PublicKey, Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, touch_point_hash, Digest, DigestHasher};
pub use merkle::{merkle_root, IncrementalMerkle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
