//! # Inbound Port - ActionEngineApi
//!
//! Primary driving port of the engine.
//!
//! ## Authorization
//!
//! | Method | Authorized Caller |
//! |--------|-------------------|
//! | `initialize` | Hub |
//! | `process` | Hub |
//! | `follow` | Hub |
//! | `unfollow` | Hub |
//! | read surface (`FollowGraph`, bindings) | anyone |

use crate::service::EngineStats;
use sg_01_module_registry::ModuleRegistry;
use shared_types::{ActionError, Address, Bytes, ModuleSelector, ProfileId, Subject, TokenId};

/// Input of a process-phase call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    /// Subject acted on.
    pub subject: Subject,
    /// Acting profile.
    pub actor_profile_id: ProfileId,
    /// Account owning the acting profile.
    pub actor_owner: Address,
    /// Account receiving the issued token. Defaults to `actor_owner`.
    pub recipient: Option<Address>,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// Subjects credited for surfacing `subject`.
    pub referrers: Vec<Subject>,
    /// Module-specific action data.
    pub payload: Bytes,
}

impl ProcessRequest {
    /// Minimal request: the actor's owner executes and receives.
    #[must_use]
    pub fn new(subject: Subject, actor_profile_id: ProfileId, actor_owner: Address) -> Self {
        Self {
            subject,
            actor_profile_id,
            actor_owner,
            recipient: None,
            transaction_executor: actor_owner,
            referrers: Vec::new(),
            payload: Bytes::new(),
        }
    }

    /// Set the module payload.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the referrers.
    #[must_use]
    pub fn with_referrers(mut self, referrers: Vec<Subject>) -> Self {
        self.referrers = referrers;
        self
    }

    /// Send the token to someone other than the actor's owner.
    #[must_use]
    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    /// Account that receives the token.
    #[must_use]
    pub fn recipient(&self) -> Address {
        self.recipient.unwrap_or(self.actor_owner)
    }
}

/// Result of a successful process-phase call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Token issued to the recipient.
    pub token_id: TokenId,
    /// Bytes returned by the module, verbatim.
    pub module_result: Bytes,
}

/// Input of a batched follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRequest {
    /// Following profile.
    pub follower_profile_id: ProfileId,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// Profiles to follow, in order.
    pub targets: Vec<ProfileId>,
    /// Per target: existing token to re-use, or `TokenId::NONE` to mint.
    pub token_ids: Vec<TokenId>,
    /// Per target: follow module payload.
    pub payloads: Vec<Bytes>,
}

impl FollowRequest {
    /// Follow every target with a fresh token and an empty payload.
    #[must_use]
    pub fn minting(follower_profile_id: ProfileId, transaction_executor: Address, targets: Vec<ProfileId>) -> Self {
        let count = targets.len();
        Self {
            follower_profile_id,
            transaction_executor,
            targets,
            token_ids: vec![TokenId::NONE; count],
            payloads: vec![Bytes::new(); count],
        }
    }
}

/// Input of a batched unfollow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfollowRequest {
    /// Profile removing its edges.
    pub unfollower_profile_id: ProfileId,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// Profiles to unfollow, in order.
    pub targets: Vec<ProfileId>,
}

/// Read-only view of the follow graph.
///
/// Reference-type modules depend on this rather than on the engine itself.
pub trait FollowGraph: Send + Sync {
    /// Whether `follower` holds a live follow token on `followed`.
    fn is_following(&self, follower: ProfileId, followed: ProfileId) -> bool;
}

/// Primary API of the Action Engine.
///
/// Every mutating method first asserts `caller == hub`, then runs as one
/// all-or-nothing call.
pub trait ActionEngineApi: FollowGraph {
    /// Attach (or clear) the module of `subject` and run its initialization
    /// hook. Returns the hook's bytes verbatim, empty when clearing.
    ///
    /// # Errors
    /// - `NotHub`: caller is not the hub
    /// - `ProfileDoesNotExist` / `PublicationDoesNotExist`: unknown subject
    /// - `ModuleNotWhitelisted`: selected module not whitelisted now
    /// - `UnknownModule`: whitelisted id with no registered implementation
    /// - any error returned by the module hook
    fn initialize(
        &self,
        caller: Address,
        subject: Subject,
        transaction_executor: Address,
        selector: ModuleSelector,
    ) -> Result<Bytes, ActionError>;

    /// Run an action on an initialized subject and issue a token.
    ///
    /// # Errors
    /// - `NotHub`: caller is not the hub
    /// - `ActionNotInitialized`: no module bound to the subject
    /// - `InvalidReferrer`, `Blocked`, existence errors
    /// - any error returned by the module hook
    fn process(&self, caller: Address, request: ProcessRequest) -> Result<ProcessOutcome, ActionError>;

    /// Follow every target in order. Returns the assigned token ids.
    ///
    /// # Errors
    /// - `ArrayMismatch`, `BatchTooLarge`
    /// - `ProfileDoesNotExist`, `SelfFollow`, `Blocked`
    /// - `AlreadyFollowing`, `FollowTokenDoesNotExist`, `NotTokenHolder`
    fn follow(&self, caller: Address, request: FollowRequest) -> Result<Vec<TokenId>, ActionError>;

    /// Remove the unfollower's edge to every target. Returns the unbound ids.
    ///
    /// # Errors
    /// - `BatchTooLarge`, `ProfileDoesNotExist`
    /// - `NotFollowing`: no ledger yet, or no live edge
    fn unfollow(&self, caller: Address, request: UnfollowRequest) -> Result<Vec<TokenId>, ActionError>;

    /// Module registry consulted by this engine.
    fn registry(&self) -> &ModuleRegistry;

    /// Counters since start-up.
    fn stats(&self) -> EngineStats;
}
