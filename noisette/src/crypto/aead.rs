use chacha20poly1305::{
    ChaCha20Poly1305, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use zeroize::Zeroize;

use crate::error::Error;

/// AEAD key length in bytes.
pub const AEAD_KEY_LEN: usize = 32;
/// AEAD tag length in bytes.
pub const AEAD_TAG_LEN: usize = 16;
/// AEAD nonce length in bytes.
pub const AEAD_NONCE_LEN: usize = 12;
/// Nonce value reserved for [`Cipher::rekey`]; never used for messages.
pub const REKEY_NONCE: u64 = u64::MAX;

/// ChaCha20-Poly1305 keyed once, used with a caller-supplied message counter.
pub struct Cipher {
    aead: ChaCha20Poly1305,
}

impl Cipher {
    pub fn new(key: &[u8; AEAD_KEY_LEN]) -> Self {
        Self {
            aead: ChaCha20Poly1305::new(key.into()),
        }
    }

    /// Encrypt `plaintext` into `out` as `ciphertext || tag`.
    ///
    /// Returns the number of bytes written (`plaintext.len() + AEAD_TAG_LEN`).
    pub fn seal(
        &self,
        counter: u64,
        ad: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let total = plaintext
            .len()
            .checked_add(AEAD_TAG_LEN)
            .ok_or(Error::MessageTooLarge)?;
        let out = out.get_mut(..total).ok_or(Error::BufferTooSmall)?;
        let (body, tag_out) = out.split_at_mut(plaintext.len());
        body.copy_from_slice(plaintext);

        let tag = self
            .aead
            .encrypt_in_place_detached(&Nonce::from(nonce(counter)), ad, body)
            .map_err(|_| Error::MessageTooLarge)?;
        tag_out.copy_from_slice(&tag);
        Ok(total)
    }

    /// Verify and decrypt `ciphertext || tag` into `out`.
    ///
    /// Returns the plaintext length. Input shorter than a tag fails the same
    /// way a forged tag does. On failure `out` holds no plaintext.
    pub fn open(
        &self,
        counter: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let plaintext_len = ciphertext
            .len()
            .checked_sub(AEAD_TAG_LEN)
            .ok_or(Error::Decrypt)?;
        let (body, tag) = ciphertext.split_at(plaintext_len);
        let out = out.get_mut(..plaintext_len).ok_or(Error::BufferTooSmall)?;
        out.copy_from_slice(body);

        let opened = self.aead.decrypt_in_place_detached(
            &Nonce::from(nonce(counter)),
            ad,
            out,
            Tag::from_slice(tag),
        );
        if opened.is_err() {
            out.zeroize();
            return Err(Error::Decrypt);
        }
        Ok(plaintext_len)
    }

    /// REKEY(k): the first 32 bytes of `ENCRYPT(k, 2^64-1, "", zeros)`.
    pub fn rekey(&self) -> Result<[u8; AEAD_KEY_LEN], Error> {
        let mut buffer = [0u8; AEAD_KEY_LEN + AEAD_TAG_LEN];
        self.seal(REKEY_NONCE, &[], &[0u8; AEAD_KEY_LEN], &mut buffer)?;
        let mut new_key = [0u8; AEAD_KEY_LEN];
        new_key.copy_from_slice(&buffer[..AEAD_KEY_LEN]);
        buffer.zeroize();
        Ok(new_key)
    }
}

/// 4 zero bytes followed by the 64-bit little-endian counter.
pub fn nonce(counter: u64) -> [u8; AEAD_NONCE_LEN] {
    let mut nonce = [0u8; AEAD_NONCE_LEN];
    nonce[4..].copy_from_slice(&counter.to_le_bytes());
    nonce
}
