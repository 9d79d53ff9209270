use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::error::Error;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LEN: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Detached Ed25519 signature over `message`.
pub fn sign(key: &SigningKey, message: &[u8]) -> [u8; SIGNATURE_LEN] {
    key.sign(message).to_bytes()
}

/// Strict Ed25519 verification (rejects small-order keys and malleable signatures).
pub fn verify(
    key: &VerifyingKey,
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<(), Error> {
    key.verify_strict(message, &Signature::from_bytes(signature))
        .map_err(|_| Error::SignatureVerification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let key = SigningKey::generate(&mut rand_core::OsRng);
        let sig = sign(&key, b"transcript");
        assert_eq!(verify(&key.verifying_key(), b"transcript", &sig), Ok(()));
    }

    #[test]
    fn wrong_message_or_key_fails() {
        let key = SigningKey::generate(&mut rand_core::OsRng);
        let other = SigningKey::generate(&mut rand_core::OsRng);
        let sig = sign(&key, b"transcript");

        assert_eq!(
            verify(&key.verifying_key(), b"other", &sig),
            Err(Error::SignatureVerification)
        );
        assert_eq!(
            verify(&other.verifying_key(), b"transcript", &sig),
            Err(Error::SignatureVerification)
        );
    }
}
