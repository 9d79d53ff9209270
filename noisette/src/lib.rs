#![deny(unsafe_code)]

//! # noisette
//!
//! A sans-IO engine for the Noise Protocol Framework with a fixed
//! ciphersuite: X25519, ChaCha20-Poly1305 and SHA-256.
//!
//! A handshake is driven by a small token interpreter over a compiled-in
//! pattern table (`NN`, `NK`, `XX`, `XK`, `IK`, `KK`, `XKpsk3` and the
//! signature-authenticated `XXsig`). Callers move bytes; this crate never
//! touches a socket.
//!
//! ```no_run
//! use noisette::{HandshakeConfig, HandshakePattern, HandshakeState, KeyPair};
//! # fn main() -> Result<(), noisette::Error> {
//! let server = KeyPair::generate(&mut rand_core::OsRng);
//!
//! let mut config = HandshakeConfig::initiator(HandshakePattern::NK);
//! config.remote_static = Some(server.public);
//! let mut initiator = HandshakeState::initialize(config)?;
//!
//! let mut msg = [0u8; 128];
//! let len = initiator.write_message(b"hello", &mut msg)?;
//! // send &msg[..len], then read the reply with `read_message`
//! # let _ = len;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! - X25519 low-order point rejection
//! - Key material zeroized on drop
//! - A PSK is only accepted after an ephemeral key has been mixed
//! - No panics on network input

pub mod crypto;
pub mod error;
pub mod keys;
pub mod pattern;

mod cipher_state;
mod handshake;
mod symmetric_state;
mod transport;

pub use cipher_state::{CipherState, MAX_MESSAGE_LEN, MAX_NONCE, MAX_PLAINTEXT_LEN};
pub use ed25519_dalek::{SigningKey, VerifyingKey};
pub use error::Error;
pub use handshake::{HandshakeAction, HandshakeConfig, HandshakeState, Role};
pub use keys::{KeyPair, PSK_LEN, Psk, PublicKey, StaticSecret};
pub use pattern::{HandshakePattern, Pattern, Token};
pub use symmetric_state::SymmetricState;
pub use transport::TransportState;
