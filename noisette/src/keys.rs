use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey as DalekPublicKey, StaticSecret as DalekStaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::x25519::DH_LEN;

/// Pre-shared symmetric key length in bytes.
pub const PSK_LEN: usize = 32;

/// A 32-byte pre-shared key, zeroized on drop.
pub type Psk = Zeroizing<[u8; PSK_LEN]>;

/// An X25519 secret scalar, used for both static and ephemeral keys.
///
/// Zeroized from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StaticSecret(DalekStaticSecret);

impl StaticSecret {
    /// Wrap raw scalar bytes; clamping happens inside the DH.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(DalekStaticSecret::from(bytes))
    }

    /// Copy out the raw scalar bytes. The caller owns zeroizing the copy.
    pub fn to_bytes(&self) -> [u8; DH_LEN] {
        self.0.to_bytes()
    }

    pub(crate) fn inner(&self) -> &DalekStaticSecret {
        &self.0
    }
}

impl core::fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("StaticSecret([REDACTED])")
    }
}

/// An X25519 public key (32 bytes). Sent in the clear for `e`, possibly
/// encrypted for `s`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; DH_LEN]);

impl PublicKey {
    pub const LEN: usize = DH_LEN;

    /// Wrap 32 bytes received from the wire or configured out of band.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw Montgomery u-coordinate.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }

    pub(crate) fn to_dalek(self) -> DalekPublicKey {
        DalekPublicKey::from(self.0)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey({:02x?})", &self.0[..4])
    }
}

/// A secret scalar together with its public point.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: StaticSecret,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from a cryptographically secure RNG.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        Self::from_secret(StaticSecret(DalekStaticSecret::random_from_rng(rng)))
    }

    /// Derive the public half from an existing secret.
    pub fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey(DalekPublicKey::from(secret.inner()).to_bytes());
        Self { secret, public }
    }

    pub fn from_secret_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self::from_secret(StaticSecret::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_matches_dalek_derivation() {
        let bytes = [42u8; DH_LEN];
        let expected = DalekPublicKey::from(&DalekStaticSecret::from(bytes)).to_bytes();

        let kp = KeyPair::from_secret_bytes(bytes);
        assert_eq!(*kp.public.as_bytes(), expected);
        assert_eq!(kp.secret.to_bytes(), bytes);
    }

    #[test]
    fn generated_keys_differ() {
        let a = KeyPair::generate(&mut rand_core::OsRng);
        let b = KeyPair::generate(&mut rand_core::OsRng);
        assert_ne!(a.public, b.public);
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = KeyPair::from_secret_bytes([7u8; DH_LEN]);
        let rendered = format!("{kp:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("[7, 7"));
    }
}
