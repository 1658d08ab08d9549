//! # Core Domain Entities
//!
//! Identifiers and value types that flow between every Social-Graph crate.
//!
//! ## Clusters
//!
//! - **Accounts**: `Address`, `ModuleId`
//! - **Subjects**: `ProfileId`, `PublicationId`, `Subject`
//! - **Relationships**: `TokenId`
//! - **Payloads**: `Bytes`, `ModuleSelector`

use crate::errors::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

// =============================================================================
// CLUSTER A: ACCOUNTS
// =============================================================================

/// A 20-byte account identifier.
///
/// Profiles are owned by accounts, modules and ledgers live at accounts, and
/// the hub and governance roles are accounts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null account.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Length of an address in bytes.
    pub const LEN: usize = 20;

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address whose last byte is `n`. Handy for fixtures.
    #[must_use]
    pub const fn from_low_u8(n: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Parses a hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(raw, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the null account.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", hex::encode(&self.0[..4]), hex::encode(&self.0[18..]))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Modules are identified by the account they live at.
pub type ModuleId = Address;

// =============================================================================
// CLUSTER B: SUBJECTS
// =============================================================================

/// Numeric profile identifier assigned by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "profile#{}", self.0)
    }
}

/// Publication identifier, unique within its author profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicationId(pub u64);

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pub#{}", self.0)
    }
}

/// Anything that can hold relationship or action state.
///
/// The engine never creates subjects; the hub hands it identifiers of
/// subjects that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// A profile (followed through follow tokens).
    Profile(ProfileId),
    /// A publication (collected through collect tokens).
    Publication {
        /// Author profile.
        profile: ProfileId,
        /// Publication within the author profile.
        publication: PublicationId,
    },
}

impl Subject {
    /// Shorthand for a publication subject.
    #[must_use]
    pub const fn publication(profile: u64, publication: u64) -> Self {
        Self::Publication {
            profile: ProfileId(profile),
            publication: PublicationId(publication),
        }
    }

    /// The profile that owns this subject.
    #[must_use]
    pub const fn owner_profile(&self) -> ProfileId {
        match self {
            Self::Profile(profile) | Self::Publication { profile, .. } => *profile,
        }
    }

    /// Returns true for profile subjects.
    #[must_use]
    pub const fn is_profile(&self) -> bool {
        matches!(self, Self::Profile(_))
    }

    /// Canonical byte encoding: a tag byte followed by big-endian ids.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Profile(profile) => {
                let mut out = Vec::with_capacity(9);
                out.push(0x01);
                out.extend_from_slice(&profile.0.to_be_bytes());
                out
            }
            Self::Publication {
                profile,
                publication,
            } => {
                let mut out = Vec::with_capacity(17);
                out.push(0x02);
                out.extend_from_slice(&profile.0.to_be_bytes());
                out.extend_from_slice(&publication.0.to_be_bytes());
                out
            }
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(profile) => write!(f, "{profile}"),
            Self::Publication {
                profile,
                publication,
            } => write!(f, "{profile}/{publication}"),
        }
    }
}

// =============================================================================
// CLUSTER C: RELATIONSHIPS
// =============================================================================

/// A relationship token issued by a ledger. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl TokenId {
    /// "No existing token": a follow with this id mints a fresh token.
    pub const NONE: Self = Self(0);

    /// Returns true if this is the zero id.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}", self.0)
    }
}

// =============================================================================
// CLUSTER D: PAYLOADS
// =============================================================================

/// Opaque payload or module result. Never interpreted by the engine.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the bytes as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

/// Module selection handed to `initialize`: which module to attach and
/// the opaque data its initialization hook receives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleSelector {
    /// Module to attach, or None to detach.
    pub module: Option<ModuleId>,
    /// Data forwarded to the module's initialization hook.
    pub payload: Bytes,
}

impl ModuleSelector {
    /// Selects `module` with `payload`. The zero address selects no module.
    #[must_use]
    pub fn new(module: ModuleId, payload: impl Into<Bytes>) -> Self {
        Self {
            module: Some(module).filter(|id| !id.is_zero()),
            payload: payload.into(),
        }
    }

    /// The module to attach, treating a zero address as none.
    #[must_use]
    pub fn target(&self) -> Option<ModuleId> {
        self.module.filter(|id| !id.is_zero())
    }

    /// Selects no module.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Decodes the wire form: `module address (20 bytes) || payload`.
    ///
    /// Empty input and an all-zero address both mean "no module".
    pub fn decode(raw: &[u8]) -> Result<Self, ActionError> {
        if raw.is_empty() {
            return Ok(Self::none());
        }
        if raw.len() < Address::LEN {
            return Err(ActionError::MalformedSelector { len: raw.len() });
        }
        let (head, payload) = raw.split_at(Address::LEN);
        let module = Address::from_slice(head).filter(|a| !a.is_zero());
        Ok(Self {
            module,
            payload: payload.into(),
        })
    }

    /// Encodes to the wire form accepted by [`ModuleSelector::decode`].
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let Some(module) = self.module else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(Address::LEN + self.payload.len());
        out.extend_from_slice(module.as_bytes());
        out.extend_from_slice(self.payload.as_slice());
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
