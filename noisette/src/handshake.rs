use ed25519_dalek::{SigningKey, VerifyingKey};
use rand_core::{CryptoRngCore, OsRng};

use crate::cipher_state::{CipherState, MAX_MESSAGE_LEN};
use crate::crypto::aead::AEAD_TAG_LEN;
use crate::crypto::hash::HASH_LEN;
use crate::crypto::signature::{self, SIGNATURE_LEN};
use crate::crypto::x25519::{self, DH_LEN};
use crate::error::Error;
use crate::keys::{KeyPair, Psk, PublicKey};
use crate::pattern::{HandshakePattern, Pattern, Token};
use crate::symmetric_state::SymmetricState;
use crate::transport::TransportState;

/// Which side of the handshake this instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    /// Whether this role writes message `index` by Noise convention.
    fn writes(self, index: usize) -> bool {
        (index % 2 == 0) == (self == Role::Initiator)
    }
}

/// The call that conventionally comes next.
///
/// Patterns do not enforce direction; this is advice for drivers that
/// follow the usual initiator-writes-first alternation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    WriteMessage,
    ReadMessage,
    /// Call `split()` or `into_transport()`.
    Complete,
}

/// Keys and parameters for one handshake, assembled before
/// [`HandshakeState::initialize`].
///
/// Which keys are required depends on the pattern and role; missing ones
/// are reported by `initialize` as [`Error::MissingKey`].
pub struct HandshakeConfig {
    pub pattern: HandshakePattern,
    pub role: Role,
    /// Our long-term X25519 key pair.
    pub local_static: Option<KeyPair>,
    /// The peer's long-term X25519 key, when known in advance.
    pub remote_static: Option<PublicKey>,
    /// Arbitrary bytes both sides must agree on; hashed, never sent.
    pub prologue: Vec<u8>,
    pub psk: Option<Psk>,
    /// Ed25519 key for our `sig` tokens.
    pub signing_key: Option<SigningKey>,
    /// Ed25519 key the peer's `sig` tokens must verify under.
    pub remote_verifying_key: Option<VerifyingKey>,
}

impl HandshakeConfig {
    pub fn new(pattern: HandshakePattern, role: Role) -> Self {
        Self {
            pattern,
            role,
            local_static: None,
            remote_static: None,
            prologue: Vec::new(),
            psk: None,
            signing_key: None,
            remote_verifying_key: None,
        }
    }

    pub fn initiator(pattern: HandshakePattern) -> Self {
        Self::new(pattern, Role::Initiator)
    }

    pub fn responder(pattern: HandshakePattern) -> Self {
        Self::new(pattern, Role::Responder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Ephemeral,
    Static,
}

/// `(local, remote)` key slots for a DH token, chosen so both roles land on
/// the same shared secret.
fn dh_operands(role: Role, token: Token) -> Option<(Slot, Slot)> {
    use Role::{Initiator, Responder};
    use Slot::{Ephemeral, Static};

    match (token, role) {
        (Token::Ee, _) => Some((Ephemeral, Ephemeral)),
        (Token::Ss, _) => Some((Static, Static)),
        (Token::Es, Initiator) | (Token::Se, Responder) => Some((Ephemeral, Static)),
        (Token::Es, Responder) | (Token::Se, Initiator) => Some((Static, Ephemeral)),
        _ => None,
    }
}

/// A Noise handshake in progress.
///
/// Drive it with alternating [`write_message`](Self::write_message) and
/// [`read_message`](Self::read_message) calls, one per pattern message,
/// then [`split`](Self::split) it into transport ciphers.
pub struct HandshakeState {
    symmetric: SymmetricState,
    pattern: &'static Pattern,
    role: Role,
    step: usize,
    s: Option<KeyPair>,
    e: Option<KeyPair>,
    rs: Option<PublicKey>,
    re: Option<PublicKey>,
    psk: Option<Psk>,
    signing_key: Option<SigningKey>,
    remote_verifying_key: Option<VerifyingKey>,
    /// Whether `e` tokens also feed the chaining key.
    psk_mode: bool,
    mixed_psk: bool,
    mixed_ephemeral: bool,
}

impl HandshakeState {
    /// Bind the protocol name, prologue and pre-message keys into a fresh
    /// transcript.
    pub fn initialize(config: HandshakeConfig) -> Result<Self, Error> {
        Self::with_pattern(config.pattern.pattern(), config)
    }

    fn with_pattern(pattern: &'static Pattern, config: HandshakeConfig) -> Result<Self, Error> {
        let HandshakeConfig {
            role,
            local_static,
            remote_static,
            prologue,
            psk,
            signing_key,
            remote_verifying_key,
            ..
        } = config;

        let mut hs = Self {
            symmetric: SymmetricState::initialize(&pattern.protocol_name()),
            pattern,
            role,
            step: 0,
            s: local_static,
            e: None,
            rs: remote_static,
            re: None,
            psk,
            signing_key,
            remote_verifying_key,
            psk_mode: pattern.uses_psk(),
            mixed_psk: false,
            mixed_ephemeral: false,
        };
        hs.check_keys()?;

        hs.symmetric.mix_hash(&prologue);
        for (owner, tokens) in [
            (Role::Initiator, pattern.initiator_pre),
            (Role::Responder, pattern.responder_pre),
        ] {
            for &token in tokens {
                let key = hs.pre_message_key(owner, token)?;
                hs.symmetric.mix_hash(key.as_bytes());
            }
        }

        tracing::debug!(
            protocol = %pattern.protocol_name(),
            role = ?role,
            "handshake initialized"
        );
        Ok(hs)
    }

    fn pre_message_key(&self, owner: Role, token: Token) -> Result<PublicKey, Error> {
        match token {
            Token::S if owner == self.role => self.local_static_public(),
            Token::S => self.rs.ok_or(Error::MissingKey("remote static key")),
            // The table only ever pre-shares static keys.
            _ => Err(Error::UnknownPattern),
        }
    }

    /// Fail early when the pattern needs a key this role was not given.
    fn check_keys(&self) -> Result<(), Error> {
        let (own_pre, peer_pre) = match self.role {
            Role::Initiator => (self.pattern.initiator_pre, self.pattern.responder_pre),
            Role::Responder => (self.pattern.responder_pre, self.pattern.initiator_pre),
        };
        let mut needs_static = own_pre.contains(&Token::S);
        let mut needs_signing = false;
        let mut needs_verifying = false;

        for (index, token) in self.pattern.tokens() {
            let ours = self.role.writes(index);
            match token {
                Token::S if ours => needs_static = true,
                Token::Sig if ours => needs_signing = true,
                Token::Sig => needs_verifying = true,
                _ => {
                    if let Some((Slot::Static, _)) = dh_operands(self.role, token) {
                        needs_static = true;
                    }
                }
            }
        }

        let required = [
            (needs_static, self.s.is_some(), "local static key"),
            (peer_pre.contains(&Token::S), self.rs.is_some(), "remote static key"),
            (self.psk_mode, self.psk.is_some(), "pre-shared key"),
            (needs_signing, self.signing_key.is_some(), "signing key"),
            (needs_verifying, self.remote_verifying_key.is_some(), "remote verifying key"),
        ];
        for (needed, present, what) in required {
            if needed && !present {
                return Err(Error::MissingKey(what));
            }
        }
        Ok(())
    }

    /// Write the next handshake message, with `payload` encrypted (once a
    /// key exists) at the end. Returns the number of bytes written to `out`.
    pub fn write_message(&mut self, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        self.write_message_with_rng(payload, out, &mut OsRng)
    }

    /// [`write_message`](Self::write_message) with an explicit RNG for the
    /// ephemeral key.
    pub fn write_message_with_rng(
        &mut self,
        payload: &[u8],
        out: &mut [u8],
        rng: &mut impl CryptoRngCore,
    ) -> Result<usize, Error> {
        let tokens = self.current_message()?;
        if payload.len() + self.next_message_overhead() > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        let mut offset = 0;

        for &token in tokens {
            match token {
                Token::E => {
                    let e = x25519::generate_keypair(rng);
                    out.get_mut(offset..offset + DH_LEN)
                        .ok_or(Error::BufferTooSmall)?
                        .copy_from_slice(e.public.as_bytes());
                    offset += DH_LEN;
                    self.mix_ephemeral(&e.public)?;
                    self.e = Some(e);
                }
                Token::S => {
                    let s = self.local_static_public()?;
                    offset += self
                        .symmetric
                        .encrypt_and_hash(s.as_bytes(), &mut out[offset..])?;
                }
                Token::Psk => self.mix_psk()?,
                Token::Sig => {
                    let key = self
                        .signing_key
                        .as_ref()
                        .ok_or(Error::MissingKey("signing key"))?;
                    let sig = signature::sign(key, self.symmetric.handshake_hash());
                    offset += self.symmetric.encrypt_and_hash(&sig, &mut out[offset..])?;
                }
                Token::Ee | Token::Es | Token::Se | Token::Ss => self.mix_dh(token)?,
            }
        }

        self.check_psk_order()?;
        self.step += 1;
        offset += self
            .symmetric
            .encrypt_and_hash(payload, &mut out[offset..])?;

        tracing::trace!(
            pattern = self.pattern.name,
            role = ?self.role,
            message = self.step,
            len = offset,
            "wrote handshake message"
        );
        self.finish_if_complete();
        Ok(offset)
    }

    /// Consume the peer's next handshake message. Returns the number of
    /// decrypted payload bytes written to `out`.
    pub fn read_message(&mut self, message: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let tokens = self.current_message()?;
        if message.len() > MAX_MESSAGE_LEN {
            return Err(Error::BadMessage);
        }
        let mut rest = message;

        for &token in tokens {
            match token {
                Token::E => {
                    let mut re = [0u8; DH_LEN];
                    re.copy_from_slice(take(&mut rest, DH_LEN)?);
                    let re = PublicKey::from_bytes(re);
                    self.mix_ephemeral(&re)?;
                    self.re = Some(re);
                }
                Token::S => {
                    let field = take(&mut rest, DH_LEN + self.symmetric.overhead())?;
                    let mut rs = [0u8; DH_LEN];
                    self.symmetric.decrypt_and_hash(field, &mut rs)?;
                    self.rs = Some(PublicKey::from_bytes(rs));
                }
                Token::Psk => self.mix_psk()?,
                Token::Sig => {
                    let field = take(&mut rest, SIGNATURE_LEN + self.symmetric.overhead())?;
                    // The writer signed h as it stood before the signature was hashed in.
                    let signed = *self.symmetric.handshake_hash();
                    let mut sig = [0u8; SIGNATURE_LEN];
                    self.symmetric.decrypt_and_hash(field, &mut sig)?;
                    let key = self
                        .remote_verifying_key
                        .as_ref()
                        .ok_or(Error::MissingKey("remote verifying key"))?;
                    if let Err(err) = signature::verify(key, &signed, &sig) {
                        tracing::debug!(
                            pattern = self.pattern.name,
                            message = self.step + 1,
                            "peer signature rejected"
                        );
                        return Err(err);
                    }
                }
                Token::Ee | Token::Es | Token::Se | Token::Ss => self.mix_dh(token)?,
            }
        }

        self.check_psk_order()?;
        self.step += 1;
        let len = self.symmetric.decrypt_and_hash(rest, out)?;

        tracing::trace!(
            pattern = self.pattern.name,
            role = ?self.role,
            message = self.step,
            len = message.len(),
            "read handshake message"
        );
        self.finish_if_complete();
        Ok(len)
    }

    /// True once every message of the pattern has been written or read.
    pub fn is_complete(&self) -> bool {
        self.step == self.pattern.len()
    }

    pub fn next_action(&self) -> HandshakeAction {
        if self.is_complete() {
            HandshakeAction::Complete
        } else if self.role.writes(self.step) {
            HandshakeAction::WriteMessage
        } else {
            HandshakeAction::ReadMessage
        }
    }

    /// Derive the transport ciphers as `(send, recv)`.
    ///
    /// The initiator's send cipher shares its key with the responder's
    /// receive cipher, and the other way round.
    pub fn split(self) -> Result<(CipherState, CipherState), Error> {
        if !self.is_complete() {
            return Err(Error::HandshakeIncomplete);
        }
        let (c1, c2) = self.symmetric.split()?;
        tracing::debug!(pattern = self.pattern.name, role = ?self.role, "handshake split");
        Ok(match self.role {
            Role::Initiator => (c1, c2),
            Role::Responder => (c2, c1),
        })
    }

    /// [`split`](Self::split), keeping the final handshake hash alongside.
    pub fn into_transport(self) -> Result<TransportState, Error> {
        let handshake_hash = *self.handshake_hash();
        let (send, recv) = self.split()?;
        Ok(TransportState::new(send, recv, handshake_hash))
    }

    /// The running handshake hash; a channel binding value once complete.
    pub fn handshake_hash(&self) -> &[u8; HASH_LEN] {
        self.symmetric.handshake_hash()
    }

    /// The peer's static key, configured or received.
    pub fn remote_static(&self) -> Option<PublicKey> {
        self.rs
    }

    /// Bytes the next message adds beyond its payload, or 0 once complete.
    ///
    /// `out` for `write_message` must hold `payload.len()` plus this.
    pub fn next_message_overhead(&self) -> usize {
        let Ok(tokens) = self.current_message() else {
            return 0;
        };
        let mut keyed = self.symmetric.has_key();
        let tag = |keyed: bool| if keyed { AEAD_TAG_LEN } else { 0 };
        let mut len = 0;
        for &token in tokens {
            match token {
                Token::E => {
                    len += DH_LEN;
                    keyed |= self.psk_mode;
                }
                Token::S => len += DH_LEN + tag(keyed),
                Token::Sig => len += SIGNATURE_LEN + tag(keyed),
                Token::Ee | Token::Es | Token::Se | Token::Ss | Token::Psk => keyed = true,
            }
        }
        len + tag(keyed)
    }

    /// Which side this state plays.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The token table being executed.
    pub fn pattern(&self) -> &'static Pattern {
        self.pattern
    }

    fn current_message(&self) -> Result<&'static [Token], Error> {
        self.pattern
            .messages
            .get(self.step)
            .copied()
            .ok_or(Error::HandshakeFinished)
    }

    fn local_static_public(&self) -> Result<PublicKey, Error> {
        self.s
            .as_ref()
            .map(|s| s.public)
            .ok_or(Error::MissingKey("local static key"))
    }

    fn mix_ephemeral(&mut self, public: &PublicKey) -> Result<(), Error> {
        self.symmetric.mix_hash(public.as_bytes());
        if self.psk_mode {
            self.symmetric.mix_key(public.as_bytes())?;
            self.mixed_ephemeral = true;
        }
        Ok(())
    }

    fn mix_psk(&mut self) -> Result<(), Error> {
        let psk = self
            .psk
            .as_ref()
            .ok_or(Error::MissingKey("pre-shared key"))?;
        self.symmetric.mix_key_and_hash(psk.as_slice())?;
        self.mixed_psk = true;
        Ok(())
    }

    fn mix_dh(&mut self, token: Token) -> Result<(), Error> {
        let (local, remote) = dh_operands(self.role, token).ok_or(Error::UnknownPattern)?;
        let local = match local {
            Slot::Ephemeral => self.e.as_ref().ok_or(Error::MissingKey("local ephemeral key"))?,
            Slot::Static => self.s.as_ref().ok_or(Error::MissingKey("local static key"))?,
        };
        let remote = match remote {
            Slot::Ephemeral => self.re.ok_or(Error::MissingKey("remote ephemeral key"))?,
            Slot::Static => self.rs.ok_or(Error::MissingKey("remote static key"))?,
        };
        let shared = x25519::dh(&local.secret, &remote)?;
        self.symmetric.mix_key(shared.as_bytes())
    }

    fn check_psk_order(&self) -> Result<(), Error> {
        if self.mixed_psk && !self.mixed_ephemeral {
            tracing::debug!(
                pattern = self.pattern.name,
                message = self.step + 1,
                "psk mixed before any ephemeral"
            );
            return Err(Error::PskReuse);
        }
        Ok(())
    }

    /// Drop the ephemeral secret once no DH can need it.
    fn finish_if_complete(&mut self) {
        if self.is_complete() {
            self.e = None;
            tracing::debug!(pattern = self.pattern.name, role = ?self.role, "handshake complete");
        }
    }
}

/// Split `len` bytes off the front of `rest`.
fn take<'a>(rest: &mut &'a [u8], len: usize) -> Result<&'a [u8], Error> {
    if rest.len() < len {
        return Err(Error::BadMessage);
    }
    let (head, tail) = rest.split_at(len);
    *rest = tail;
    Ok(head)
}
