use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::aead::{AEAD_KEY_LEN, AEAD_TAG_LEN, Cipher, REKEY_NONCE};
use crate::error::Error;

/// Largest Noise message, handshake or transport, in bytes.
pub const MAX_MESSAGE_LEN: usize = u16::MAX as usize;
/// Largest plaintext that still fits a maximum-size message once tagged.
pub const MAX_PLAINTEXT_LEN: usize = MAX_MESSAGE_LEN - AEAD_TAG_LEN;
/// Highest nonce usable for messages; `2^64 - 1` belongs to rekey.
pub const MAX_NONCE: u64 = REKEY_NONCE - 1;

/// A symmetric key and its message counter, one direction of a channel.
///
/// The nonce only ever moves forward: every encrypt or decrypt under a key
/// consumes one value, including a decrypt that fails authentication.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherState {
    key: Option<[u8; AEAD_KEY_LEN]>,
    #[zeroize(skip)]
    cipher: Option<Cipher>,
    #[zeroize(skip)]
    nonce: u64,
}

impl CipherState {
    /// A state with no key: encryption is the identity.
    pub fn empty() -> Self {
        Self {
            key: None,
            cipher: None,
            nonce: 0,
        }
    }

    /// A state keyed with `key`, nonce at zero.
    pub fn with_key(key: [u8; AEAD_KEY_LEN]) -> Self {
        let mut cs = Self::empty();
        cs.initialize_key(key);
        cs
    }

    /// Replace the key and reset the nonce to zero.
    pub fn initialize_key(&mut self, key: [u8; AEAD_KEY_LEN]) {
        self.cipher = Some(Cipher::new(&key));
        if let Some(old) = self.key.as_mut() {
            old.zeroize();
        }
        self.key = Some(key);
        self.nonce = 0;
    }

    /// Whether this CipherState has a key set.
    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// The next nonce to be used.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Move the counter explicitly, for transports that carry it out of band.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// Bytes added by encryption under the current key.
    pub fn overhead(&self) -> usize {
        if self.has_key() { AEAD_TAG_LEN } else { 0 }
    }

    /// `EncryptWithAd(ad, plaintext)`, written to `out`.
    ///
    /// Without a key the plaintext is copied through unchanged.
    /// Returns the number of bytes written.
    pub fn encrypt_with_ad(
        &mut self,
        ad: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        if plaintext.len() > MAX_PLAINTEXT_LEN {
            return Err(Error::MessageTooLarge);
        }
        self.check_nonce()?;
        let Some(cipher) = &self.cipher else {
            return pass_through(plaintext, out);
        };
        let len = cipher.seal(self.nonce, ad, plaintext, out)?;
        self.nonce += 1;
        Ok(len)
    }

    /// `DecryptWithAd(ad, ciphertext)`, written to `out`.
    ///
    /// Without a key the ciphertext is copied through unchanged.
    /// Returns the number of plaintext bytes written.
    pub fn decrypt_with_ad(
        &mut self,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        if ciphertext.len() > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        self.check_nonce()?;
        let Some(cipher) = &self.cipher else {
            return pass_through(ciphertext, out);
        };
        let opened = cipher.open(self.nonce, ad, ciphertext, out);
        // A rejected ciphertext still burns its nonce.
        self.nonce += 1;
        opened
    }

    /// `Rekey()`: derive a new key from the current one under the reserved
    /// nonce. The message counter is left as is. No-op without a key.
    pub fn rekey(&mut self) -> Result<(), Error> {
        let Some(cipher) = &self.cipher else {
            return Ok(());
        };
        let new_key = cipher.rekey()?;
        let nonce = self.nonce;
        self.initialize_key(new_key);
        self.nonce = nonce;
        tracing::trace!(nonce, "cipher state rekeyed");
        Ok(())
    }

    fn check_nonce(&self) -> Result<(), Error> {
        if self.nonce > MAX_NONCE {
            return Err(Error::NonceOverflow);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn key_bytes(&self) -> Option<&[u8; AEAD_KEY_LEN]> {
        self.key.as_ref()
    }
}

impl core::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherState")
            .field("has_key", &self.has_key())
            .field("nonce", &self.nonce)
            .finish()
    }
}

fn pass_through(input: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let out = out.get_mut(..input.len()).ok_or(Error::BufferTooSmall)?;
    out.copy_from_slice(input);
    Ok(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; AEAD_KEY_LEN] = [0x42; AEAD_KEY_LEN];

    fn pair() -> (CipherState, CipherState) {
        (CipherState::with_key(KEY), CipherState::with_key(KEY))
    }

    #[test]
    fn no_key_passthrough() {
        let mut cs = CipherState::empty();
        let mut out = [0u8; 32];

        let len = cs.encrypt_with_ad(b"ad", b"hello", &mut out).unwrap();
        assert_eq!(&out[..len], b"hello");
        let len = cs.decrypt_with_ad(b"ad", b"pass through", &mut out).unwrap();
        assert_eq!(&out[..len], b"pass through");
        assert_eq!(cs.nonce(), 0);
        assert_eq!(cs.overhead(), 0);
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let (mut enc, mut dec) = pair();
        let mut ct = [0u8; 128];
        let ct_len = enc.encrypt_with_ad(b"ad", b"noise protocol", &mut ct).unwrap();
        assert_eq!(ct_len, 14 + AEAD_TAG_LEN);

        let mut pt = [0u8; 128];
        let pt_len = dec.decrypt_with_ad(b"ad", &ct[..ct_len], &mut pt).unwrap();
        assert_eq!(&pt[..pt_len], b"noise protocol");
    }

    #[test]
    fn max_size_plaintext_round_trips() {
        let (mut enc, mut dec) = pair();
        let plaintext = vec![0xa5u8; MAX_PLAINTEXT_LEN];
        let mut ct = vec![0u8; MAX_MESSAGE_LEN];
        let ct_len = enc.encrypt_with_ad(&[], &plaintext, &mut ct).unwrap();
        assert_eq!(ct_len, MAX_MESSAGE_LEN);

        let mut pt = vec![0u8; MAX_PLAINTEXT_LEN];
        let pt_len = dec.decrypt_with_ad(&[], &ct, &mut pt).unwrap();
        assert_eq!(pt[..pt_len], plaintext[..]);
    }

    #[test]
    fn oversized_messages_rejected() {
        let (mut enc, mut dec) = pair();
        let big = vec![0u8; MAX_MESSAGE_LEN + 1];
        let mut out = vec![0u8; MAX_MESSAGE_LEN + 32];

        assert_eq!(
            enc.encrypt_with_ad(&[], &big[..MAX_PLAINTEXT_LEN + 1], &mut out),
            Err(Error::MessageTooLarge)
        );
        assert_eq!(
            dec.decrypt_with_ad(&[], &big, &mut out),
            Err(Error::MessageTooLarge)
        );
        assert_eq!(enc.nonce(), 0);
        assert_eq!(dec.nonce(), 0);
    }

    #[test]
    fn nonce_counts_operations() {
        let (mut enc, mut dec) = pair();
        let mut ct = [0u8; 64];
        let mut pt = [0u8; 64];
        for n in 0..5u64 {
            assert_eq!(enc.nonce(), n);
            let len = enc.encrypt_with_ad(&[], b"a", &mut ct).unwrap();
            dec.decrypt_with_ad(&[], &ct[..len], &mut pt).unwrap();
        }
        assert_eq!(enc.nonce(), 5);
        assert_eq!(dec.nonce(), 5);
    }

    #[test]
    fn same_plaintext_different_ciphertext() {
        let mut cs = CipherState::with_key(KEY);
        let mut ct1 = [0u8; 32];
        let mut ct2 = [0u8; 32];
        let len1 = cs.encrypt_with_ad(b"", b"a", &mut ct1).unwrap();
        let len2 = cs.encrypt_with_ad(b"", b"a", &mut ct2).unwrap();
        assert_ne!(&ct1[..len1], &ct2[..len2]);
    }

    #[test]
    fn failed_decrypt_consumes_nonce() {
        let (mut enc, mut dec) = pair();
        let mut ct = [0u8; 64];
        let len = enc.encrypt_with_ad(&[], b"first", &mut ct).unwrap();
        ct[0] ^= 1;

        let mut pt = [0u8; 64];
        assert_eq!(
            dec.decrypt_with_ad(&[], &ct[..len], &mut pt),
            Err(Error::Decrypt)
        );
        assert_eq!(dec.nonce(), 1);

        // Retrying the repaired ciphertext now uses the wrong nonce.
        ct[0] ^= 1;
        assert_eq!(
            dec.decrypt_with_ad(&[], &ct[..len], &mut pt),
            Err(Error::Decrypt)
        );
    }

    #[test]
    fn nonce_exhaustion() {
        let mut cs = CipherState::with_key(KEY);
        cs.set_nonce(MAX_NONCE);
        let mut out = [0u8; 64];
        cs.encrypt_with_ad(&[], b"last", &mut out).unwrap();
        assert_eq!(cs.nonce(), REKEY_NONCE);

        assert_eq!(
            cs.encrypt_with_ad(&[], b"one more", &mut out),
            Err(Error::NonceOverflow)
        );
        assert_eq!(
            cs.decrypt_with_ad(&[], &out[..20], &mut [0u8; 64]),
            Err(Error::NonceOverflow)
        );
    }

    #[test]
    fn rekey_keeps_nonce_and_stays_in_sync() {
        let (mut a, mut b) = pair();
        let mut ct = [0u8; 64];
        let mut pt = [0u8; 64];
        let len = a.encrypt_with_ad(&[], b"before", &mut ct).unwrap();
        b.decrypt_with_ad(&[], &ct[..len], &mut pt).unwrap();

        a.rekey().unwrap();
        b.rekey().unwrap();
        assert_eq!(a.nonce(), 1);
        assert_ne!(a.key_bytes(), Some(&KEY));
        assert_eq!(a.key_bytes(), b.key_bytes());

        let len = a.encrypt_with_ad(&[], b"after rekey", &mut ct).unwrap();
        let pt_len = b.decrypt_with_ad(&[], &ct[..len], &mut pt).unwrap();
        assert_eq!(&pt[..pt_len], b"after rekey");
    }

    #[test]
    fn rekey_on_one_side_only_desyncs() {
        let (mut a, mut b) = pair();
        a.rekey().unwrap();
        let mut ct = [0u8; 64];
        let len = a.encrypt_with_ad(&[], b"x", &mut ct).unwrap();
        assert_eq!(
            b.decrypt_with_ad(&[], &ct[..len], &mut [0u8; 64]),
            Err(Error::Decrypt)
        );
    }

    #[test]
    fn initialize_key_resets_nonce() {
        let mut cs = CipherState::with_key(KEY);
        cs.set_nonce(9);
        cs.initialize_key([0x11; AEAD_KEY_LEN]);
        assert_eq!(cs.nonce(), 0);
        assert!(cs.has_key());
        assert_eq!(cs.overhead(), AEAD_TAG_LEN);
    }
}
