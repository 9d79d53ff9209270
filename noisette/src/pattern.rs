//! The compiled-in table of handshake patterns.
//!
//! Patterns are plain `static` data: a list of pre-message tokens per side
//! and the ordered token list of every message. Message `i` is written by
//! the initiator when `i` is even and by the responder when it is odd.

use core::fmt;
use core::str::FromStr;

use crate::error::Error;

/// Suffix naming the fixed DH, cipher and hash of every protocol.
pub const CIPHER_SUITE: &str = "25519_ChaChaPoly_SHA256";

/// One primitive action inside a handshake message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Ephemeral public key, always in the clear.
    E,
    /// Static public key, encrypted once a key exists.
    S,
    Ee,
    Es,
    Se,
    Ss,
    /// Mix the pre-shared key into chaining key and hash.
    Psk,
    /// Detached Ed25519 signature over the handshake hash.
    Sig,
}

/// A handshake pattern.
#[derive(Debug)]
pub struct Pattern {
    pub name: &'static str,
    /// Initiator keys the responder knows before the first message.
    pub initiator_pre: &'static [Token],
    /// Responder keys the initiator knows before the first message.
    pub responder_pre: &'static [Token],
    pub messages: &'static [&'static [Token]],
}

impl Pattern {
    /// Number of handshake messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any message mixes a pre-shared key.
    pub fn uses_psk(&self) -> bool {
        self.tokens().any(|(_, token)| token == Token::Psk)
    }

    /// `Noise_<name>_25519_ChaChaPoly_SHA256`.
    pub fn protocol_name(&self) -> String {
        format!("Noise_{}_{}", self.name, CIPHER_SUITE)
    }

    /// Every message token paired with the index of its message.
    pub(crate) fn tokens(&self) -> impl Iterator<Item = (usize, Token)> + '_ {
        self.messages
            .iter()
            .enumerate()
            .flat_map(|(i, msg)| msg.iter().map(move |&token| (i, token)))
    }
}

use Token::{E, Ee, Es, Psk, S, Se, Sig, Ss};

static NN: Pattern = Pattern {
    name: "NN",
    initiator_pre: &[],
    responder_pre: &[],
    messages: &[&[E], &[E, Ee]],
};

static NK: Pattern = Pattern {
    name: "NK",
    initiator_pre: &[],
    responder_pre: &[S],
    messages: &[&[E, Es], &[E, Ee]],
};

static XX: Pattern = Pattern {
    name: "XX",
    initiator_pre: &[],
    responder_pre: &[],
    messages: &[&[E], &[E, Ee, S, Es], &[S, Se]],
};

static XK: Pattern = Pattern {
    name: "XK",
    initiator_pre: &[],
    responder_pre: &[S],
    messages: &[&[E, Es], &[E, Ee], &[S, Se]],
};

static IK: Pattern = Pattern {
    name: "IK",
    initiator_pre: &[],
    responder_pre: &[S],
    messages: &[&[E, Es, S, Ss], &[E, Ee, Se]],
};

static KK: Pattern = Pattern {
    name: "KK",
    initiator_pre: &[S],
    responder_pre: &[S],
    messages: &[&[E, Es, Ss], &[E, Ee, Se]],
};

static XK_PSK3: Pattern = Pattern {
    name: "XKpsk3",
    initiator_pre: &[],
    responder_pre: &[S],
    messages: &[&[E, Es], &[E, Ee], &[S, Se, Psk]],
};

// Static keys are authenticated by signature instead of DH; verifying keys
// are exchanged out of band.
static XX_SIG: Pattern = Pattern {
    name: "XXsig",
    initiator_pre: &[],
    responder_pre: &[],
    messages: &[&[E], &[E, Ee, Sig], &[Sig]],
};

/// Names of the supported handshake patterns.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakePattern {
    NN,
    NK,
    XX,
    XK,
    IK,
    KK,
    XKpsk3,
    XXsig,
}

impl HandshakePattern {
    pub const ALL: [HandshakePattern; 8] = [
        Self::NN,
        Self::NK,
        Self::XX,
        Self::XK,
        Self::IK,
        Self::KK,
        Self::XKpsk3,
        Self::XXsig,
    ];

    /// The token table for this pattern.
    pub fn pattern(self) -> &'static Pattern {
        match self {
            Self::NN => &NN,
            Self::NK => &NK,
            Self::XX => &XX,
            Self::XK => &XK,
            Self::IK => &IK,
            Self::KK => &KK,
            Self::XKpsk3 => &XK_PSK3,
            Self::XXsig => &XX_SIG,
        }
    }
}

impl fmt::Display for HandshakePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern().name)
    }
}

impl FromStr for HandshakePattern {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.pattern().name == name)
            .ok_or(Error::UnknownPattern)
    }
}
