use zeroize::Zeroize;

use crate::cipher_state::CipherState;
use crate::crypto::hash::HASH_LEN;
use crate::error::Error;

/// Post-handshake transport encryption state.
///
/// Holds the sending and receiving `CipherState`s already oriented for this
/// side, so `write_message` on one peer pairs with `read_message` on the
/// other.
pub struct TransportState {
    send: CipherState,
    recv: CipherState,
    handshake_hash: [u8; HASH_LEN],
}

impl Drop for TransportState {
    fn drop(&mut self) {
        self.handshake_hash.zeroize();
    }
}

impl TransportState {
    pub(crate) fn new(send: CipherState, recv: CipherState, handshake_hash: [u8; HASH_LEN]) -> Self {
        Self {
            send,
            recv,
            handshake_hash,
        }
    }

    /// Encrypt a payload for the peer, with empty associated data.
    ///
    /// Returns the number of bytes written to `out` (payload + AEAD tag).
    pub fn write_message(&mut self, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let len = self.send.encrypt_with_ad(&[], payload, out)?;
        tracing::trace!(nonce = self.send.nonce(), len, "sealed transport message");
        Ok(len)
    }

    /// Decrypt a message from the peer.
    ///
    /// Returns the number of plaintext bytes written to `out`. A failed
    /// message still advances the receive nonce, so the channel cannot
    /// recover from loss or reordering.
    pub fn read_message(&mut self, message: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let opened = self.recv.decrypt_with_ad(&[], message, out);
        if opened.is_err() {
            tracing::debug!(nonce = self.recv.nonce(), "transport message rejected");
        }
        opened
    }

    /// The final handshake hash, identical on both sides.
    pub fn handshake_hash(&self) -> &[u8; HASH_LEN] {
        &self.handshake_hash
    }

    /// The AEAD tag overhead per transport message.
    pub fn overhead(&self) -> usize {
        self.send.overhead()
    }

    /// Nonce the next `write_message` will use.
    pub fn sending_nonce(&self) -> u64 {
        self.send.nonce()
    }

    /// Nonce the next `read_message` will use.
    pub fn receiving_nonce(&self) -> u64 {
        self.recv.nonce()
    }

    /// Rekey the sending cipher. The peer must call `rekey_recv` at the same
    /// point in the stream.
    pub fn rekey_send(&mut self) -> Result<(), Error> {
        self.send.rekey()
    }

    /// Rekey the receiving cipher, mirroring the peer's `rekey_send`.
    pub fn rekey_recv(&mut self) -> Result<(), Error> {
        self.recv.rekey()
    }

    /// Give up the pairing and return `(send, recv)` for independent use,
    /// e.g. one per task.
    pub fn into_split(mut self) -> (CipherState, CipherState) {
        let send = core::mem::replace(&mut self.send, CipherState::empty());
        let recv = core::mem::replace(&mut self.recv, CipherState::empty());
        (send, recv)
    }
}
