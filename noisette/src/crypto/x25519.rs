use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;
use crate::keys::{KeyPair, PublicKey, StaticSecret};

/// DH output and public key length in bytes (X25519 = 32).
pub const DH_LEN: usize = 32;

/// Output of one X25519 operation. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; DH_LEN]);

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }
}

/// `GENERATE_KEYPAIR()`: a fresh random X25519 key pair.
pub fn generate_keypair(rng: &mut impl CryptoRngCore) -> KeyPair {
    KeyPair::generate(rng)
}

/// `DH(secret, public)`.
///
/// Fails with [`Error::BadKey`] when the peer key is a low-order point and
/// the result collapses to all zeros.
pub fn dh(local: &StaticSecret, remote: &PublicKey) -> Result<SharedSecret, Error> {
    let shared = local.inner().diffie_hellman(&remote.to_dalek());
    if bool::from(shared.as_bytes().ct_eq(&[0u8; DH_LEN])) {
        return Err(Error::BadKey);
    }
    Ok(SharedSecret(shared.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_agree() {
        let a = generate_keypair(&mut rand_core::OsRng);
        let b = generate_keypair(&mut rand_core::OsRng);

        let ab = dh(&a.secret, &b.public).unwrap();
        let ba = dh(&b.secret, &a.public).unwrap();
        assert_eq!(ab.as_bytes(), ba.as_bytes());
    }

    #[test]
    fn rejects_identity_point() {
        let secret = StaticSecret::from_bytes([1u8; DH_LEN]);
        let identity = PublicKey::from_bytes([0u8; DH_LEN]);
        assert_eq!(dh(&secret, &identity).unwrap_err(), Error::BadKey);
    }

    #[test]
    fn rejects_order_two_point() {
        let mut point = [0u8; DH_LEN];
        point[0] = 1;
        let secret = StaticSecret::from_bytes([0x42u8; DH_LEN]);
        assert_eq!(
            dh(&secret, &PublicKey::from_bytes(point)).unwrap_err(),
            Error::BadKey
        );
    }
}
