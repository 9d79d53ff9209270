use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::cipher_state::CipherState;
use crate::crypto::aead::AEAD_KEY_LEN;
use crate::crypto::hash::{self, HASH_LEN, HkdfBlock};
use crate::error::Error;

/// Noise SymmetricState: chaining key, handshake hash, and the
/// handshake-phase cipher.
///
/// Every public value and every ciphertext that crosses the wire during the
/// handshake goes through [`mix_hash`](Self::mix_hash), in order, on both
/// sides. Any divergence shows up as a failed AEAD tag on the next
/// encrypted field.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricState {
    cipher: CipherState,
    ck: Zeroizing<[u8; HASH_LEN]>,
    h: [u8; HASH_LEN],
}

impl SymmetricState {
    /// `InitializeSymmetric(protocol_name)`.
    ///
    /// Names up to `HASH_LEN` bytes are zero-padded into `h`; longer names
    /// are hashed.
    pub fn initialize(protocol_name: &str) -> Self {
        let name = protocol_name.as_bytes();
        let h = if name.len() <= HASH_LEN {
            let mut h = [0u8; HASH_LEN];
            h[..name.len()].copy_from_slice(name);
            h
        } else {
            hash::hash(name)
        };

        Self {
            cipher: CipherState::empty(),
            ck: Zeroizing::new(h),
            h,
        }
    }

    /// `MixKey(ikm)`: `(ck, k) = HKDF(ck, ikm, 2)`, cipher rekeyed with `k`.
    pub fn mix_key(&mut self, input_key_material: &[u8]) -> Result<(), Error> {
        let (ck, temp_k) = hash::hkdf2(&self.ck, input_key_material)?;
        *self.ck = *ck;
        self.cipher.initialize_key(cipher_key(&temp_k));
        Ok(())
    }

    /// `MixHash(data)`: `h = HASH(h || data)`.
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = hash::hash_two(&self.h, data);
    }

    /// `MixKeyAndHash(ikm)`: `(ck, th, k) = HKDF(ck, ikm, 3)`, then
    /// `MixHash(th)` and the cipher rekeyed with `k`.
    pub fn mix_key_and_hash(&mut self, input_key_material: &[u8]) -> Result<(), Error> {
        let (ck, temp_h, temp_k) = hash::hkdf3(&self.ck, input_key_material)?;
        *self.ck = *ck;
        self.mix_hash(temp_h.as_slice());
        self.cipher.initialize_key(cipher_key(&temp_k));
        Ok(())
    }

    /// Whether a cipher key has been derived yet.
    pub fn has_key(&self) -> bool {
        self.cipher.has_key()
    }

    /// Bytes [`encrypt_and_hash`](Self::encrypt_and_hash) adds right now.
    pub fn overhead(&self) -> usize {
        self.cipher.overhead()
    }

    /// `EncryptAndHash(plaintext)`: encrypt with `h` as AD, then mix the
    /// ciphertext into `h`. Returns the bytes written to `out`.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let len = self.cipher.encrypt_with_ad(&self.h, plaintext, out)?;
        self.mix_hash(&out[..len]);
        Ok(len)
    }

    /// `DecryptAndHash(ciphertext)`: decrypt with `h` as AD, then mix the
    /// ciphertext (not the plaintext) into `h`.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let len = self.cipher.decrypt_with_ad(&self.h, ciphertext, out)?;
        self.mix_hash(ciphertext);
        Ok(len)
    }

    /// `Split()`: `(k1, k2) = HKDF(ck, "", 2)`, two fresh CipherStates.
    pub fn split(&self) -> Result<(CipherState, CipherState), Error> {
        let (temp_k1, temp_k2) = hash::hkdf2(&self.ck, &[])?;
        Ok((
            CipherState::with_key(cipher_key(&temp_k1)),
            CipherState::with_key(cipher_key(&temp_k2)),
        ))
    }

    /// The current handshake hash `h`.
    pub fn handshake_hash(&self) -> &[u8; HASH_LEN] {
        &self.h
    }
}

// HASH_LEN and AEAD_KEY_LEN are both 32, so no truncation is needed.
fn cipher_key(block: &HkdfBlock) -> [u8; AEAD_KEY_LEN] {
    let mut key = [0u8; AEAD_KEY_LEN];
    key.copy_from_slice(&block[..AEAD_KEY_LEN]);
    key
}
