use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::Error;

/// Hash output length (SHA-256 = 32 bytes).
pub const HASH_LEN: usize = 32;

/// A zeroized 32-byte KDF output block.
pub type HkdfBlock = Zeroizing<[u8; HASH_LEN]>;

/// SHA-256 of `input`.
pub fn hash(input: &[u8]) -> [u8; HASH_LEN] {
    Sha256::digest(input).into()
}

/// SHA-256 of `a || b` without concatenating.
pub fn hash_two(a: &[u8], b: &[u8]) -> [u8; HASH_LEN] {
    Sha256::new().chain_update(a).chain_update(b).finalize().into()
}

/// `HKDF(chaining_key, input_key_material, 2)` from the Noise framework.
///
/// The Noise construction is RFC 5869 extract-then-expand with the chaining
/// key as salt and an empty info string, so `hkdf` computes it directly:
/// `output1 = HMAC(temp_key, 0x01)`, `output2 = HMAC(temp_key, output1 || 0x02)`.
pub fn hkdf2(
    chaining_key: &[u8; HASH_LEN],
    input_key_material: &[u8],
) -> Result<(HkdfBlock, HkdfBlock), Error> {
    let okm = expand::<{ 2 * HASH_LEN }>(chaining_key, input_key_material)?;
    Ok((block(okm.as_slice(), 0), block(okm.as_slice(), 1)))
}

/// `HKDF(chaining_key, input_key_material, 3)`, used for PSK mixing.
pub fn hkdf3(
    chaining_key: &[u8; HASH_LEN],
    input_key_material: &[u8],
) -> Result<(HkdfBlock, HkdfBlock, HkdfBlock), Error> {
    let okm = expand::<{ 3 * HASH_LEN }>(chaining_key, input_key_material)?;
    Ok((block(okm.as_slice(), 0), block(okm.as_slice(), 1), block(okm.as_slice(), 2)))
}

fn expand<const N: usize>(
    chaining_key: &[u8; HASH_LEN],
    input_key_material: &[u8],
) -> Result<Zeroizing<[u8; N]>, Error> {
    let mut okm = Zeroizing::new([0u8; N]);
    Hkdf::<Sha256>::new(Some(chaining_key.as_slice()), input_key_material)
        .expand(&[], okm.as_mut_slice())
        .map_err(|_| Error::KeyDerivation)?;
    Ok(okm)
}

fn block(okm: &[u8], index: usize) -> HkdfBlock {
    let mut out = Zeroizing::new([0u8; HASH_LEN]);
    out.copy_from_slice(&okm[index * HASH_LEN..(index + 1) * HASH_LEN]);
    out
}
