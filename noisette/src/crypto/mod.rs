//! Cryptographic primitives behind the fixed `25519_ChaChaPoly_SHA256` suite.
//!
//! - [`aead`]: ChaCha20-Poly1305 with the Noise nonce layout
//! - [`hash`]: SHA-256 and the two/three-output HKDF
//! - [`signature`]: Ed25519 for the `sig` token
//! - [`x25519`]: X25519 Diffie-Hellman with low-order point rejection

pub mod aead;
pub mod hash;
pub mod signature;
pub mod x25519;
