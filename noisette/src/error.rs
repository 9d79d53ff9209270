/// Errors that can occur during the Noise handshake or transport phase.
///
/// Every variant is terminal for the handshake or the affected
/// `CipherState`: once one is returned the session must be abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `write_message`/`read_message` was called after the last pattern step.
    #[error("handshake already finished")]
    HandshakeFinished,
    /// `split`/`into_transport` was called before the last pattern step.
    #[error("handshake not yet complete")]
    HandshakeIncomplete,
    /// A pre-shared key was mixed without a fresh ephemeral in the same transcript.
    #[error("potential PSK reuse, an ephemeral key must be mixed before encrypting with a mixed PSK")]
    PskReuse,
    /// The peer's `sig` token did not verify against the transcript hash.
    #[error("signature verification failed")]
    SignatureVerification,
    /// AEAD tag mismatch or truncated ciphertext.
    #[error("AEAD authentication failed")]
    Decrypt,
    /// The nonce counter reached the value reserved for rekeying.
    #[error("nonce overflow")]
    NonceOverflow,
    /// Plaintext or ciphertext exceeds the Noise message size limit.
    #[error("message too big")]
    MessageTooLarge,
    /// The provided output buffer is too small.
    #[error("output buffer too small")]
    BufferTooSmall,
    /// The handshake message is malformed or truncated.
    #[error("malformed handshake message")]
    BadMessage,
    /// A Diffie-Hellman operation produced the all-zero output (low-order point).
    #[error("invalid public key")]
    BadKey,
    /// A key required by the pattern for this role was not provided.
    #[error("missing {0}")]
    MissingKey(&'static str),
    /// The pattern name is not part of the compiled-in table.
    #[error("unknown handshake pattern")]
    UnknownPattern,
    /// HKDF rejected the requested output length.
    #[error("key derivation failed")]
    KeyDerivation,
}
