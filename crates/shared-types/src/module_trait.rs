//! # Module Trait - Pluggable Action Logic
//!
//! Defines the flat capability set every follow or action module implements.
//! Modules are untrusted: a hook may fail, and it may re-enter the engine
//! before returning.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{ActionModule, Bytes, InitializeContext, ProcessContext, ActionError};
//!
//! pub struct FreeCollect;
//!
//! impl ActionModule for FreeCollect {
//!     fn name(&self) -> &str { "free-collect" }
//!     fn initialize(&self, _ctx: &InitializeContext) -> Result<Bytes, ActionError> { Ok(Bytes::new()) }
//!     fn process(&self, _ctx: &ProcessContext) -> Result<Bytes, ActionError> { Ok(Bytes::new()) }
//! }
//! ```

use crate::entities::{Address, Bytes, ProfileId, Subject, TokenId};
use crate::errors::ActionError;
use std::sync::Arc;

/// Data handed to a module's initialization hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeContext {
    /// Subject the module is being attached to.
    pub subject: Subject,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// Module-specific initialization data.
    pub payload: Bytes,
}

/// Data handed to a module's processing hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessContext {
    /// Subject the action targets.
    pub subject: Subject,
    /// Profile performing the action.
    pub actor_profile_id: ProfileId,
    /// Token issued (or re-bound) by this action. Already committed.
    pub token_id: TokenId,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// Subjects credited for surfacing the target.
    pub referrers: Vec<Subject>,
    /// Module-specific action data.
    pub payload: Bytes,
}

/// The capability interface of a follow or action module.
pub trait ActionModule: Send + Sync {
    /// Human-readable name, for diagnostics only.
    fn name(&self) -> &str;

    /// Called when the module is attached to a subject.
    ///
    /// The returned bytes are handed back to the caller verbatim.
    fn initialize(&self, ctx: &InitializeContext) -> Result<Bytes, ActionError>;

    /// Called for every action on a subject the module is attached to.
    ///
    /// Returning an error aborts the enclosing call and rolls back its
    /// token issuance.
    fn process(&self, ctx: &ProcessContext) -> Result<Bytes, ActionError>;
}

/// Shared handle to a module implementation.
pub type DynModule = Arc<dyn ActionModule>;

// =============================================================================
// TESTS
// =============================================================================
