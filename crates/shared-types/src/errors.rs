//! # Error Types
//!
//! The single failure taxonomy shared by the registry, the ledgers, the
//! engine and every module. A failure always aborts the whole call; there is
//! no partially-applied outcome.

use crate::entities::{Address, ModuleId, ProfileId, PublicationId, Subject, TokenId};
use thiserror::Error;

/// Errors raised by any Social-Graph operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    // =========================================================================
    // ROLE GATES
    // =========================================================================
    /// Caller lacks the governance capability.
    #[error("unauthorized: {caller:?} is not governance")]
    Unauthorized { caller: Address },

    /// Caller is not the orchestrator (hub).
    #[error("not hub: {caller:?} is not the orchestrator")]
    NotHub { caller: Address },

    // =========================================================================
    // MODULE GATING
    // =========================================================================
    /// Module is not whitelisted at initialization time.
    #[error("module not whitelisted: {0:?}")]
    ModuleNotWhitelisted(ModuleId),

    /// No implementation registered under this module id.
    #[error("unknown module: {0:?}")]
    UnknownModule(ModuleId),

    /// An implementation is already registered under this id.
    #[error("module already registered: {0:?}")]
    ModuleAlreadyRegistered(ModuleId),

    /// Subject has no module bound and the action requires one.
    #[error("action not initialized for {0}")]
    ActionNotInitialized(Subject),

    /// A module hook refused the operation.
    #[error("module {module:?} rejected: {reason}")]
    ModuleRejected { module: ModuleId, reason: String },

    /// Module hooks re-entered the engine deeper than the configured limit.
    #[error("call depth exceeded: {depth} nested calls")]
    CallDepthExceeded { depth: u32 },

    // =========================================================================
    // INPUT SHAPE
    // =========================================================================
    /// Batched inputs have different lengths.
    #[error("array mismatch: {targets} targets, {token_ids} token ids, {payloads} payloads")]
    ArrayMismatch {
        targets: usize,
        token_ids: usize,
        payloads: usize,
    },

    /// Batch exceeds the configured limit.
    #[error("batch too large: {size} > {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Module selector shorter than an address.
    #[error("malformed module selector: {len} bytes")]
    MalformedSelector { len: usize },

    /// Referrer does not exist or points at the processed subject.
    #[error("invalid referrer: {0}")]
    InvalidReferrer(Subject),

    // =========================================================================
    // STATE PRECONDITIONS
    // =========================================================================
    /// Profile does not exist.
    #[error("profile does not exist: {0}")]
    ProfileDoesNotExist(ProfileId),

    /// Publication does not exist.
    #[error("publication does not exist: {profile}/{publication}")]
    PublicationDoesNotExist {
        profile: ProfileId,
        publication: PublicationId,
    },

    /// A profile tried to follow itself.
    #[error("self follow: {0}")]
    SelfFollow(ProfileId),

    /// One party has blocked the other.
    #[error("blocked: {blocker} blocked {blocked}")]
    Blocked {
        blocker: ProfileId,
        blocked: ProfileId,
    },

    /// No live follow edge exists.
    #[error("{follower} is not following {followed}")]
    NotFollowing {
        follower: ProfileId,
        followed: ProfileId,
    },

    /// A live follow edge already exists.
    #[error("{follower} already follows {followed}")]
    AlreadyFollowing {
        follower: ProfileId,
        followed: ProfileId,
    },

    /// Supplied follow token was never issued.
    #[error("follow token does not exist: {0}")]
    FollowTokenDoesNotExist(TokenId),

    /// Neither the new follower's owner nor the executor holds the token.
    #[error("{token} is held by {holder:?}")]
    NotTokenHolder { token: TokenId, holder: Address },
}

impl ActionError {
    /// Returns true for role-gate failures.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::NotHub { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
