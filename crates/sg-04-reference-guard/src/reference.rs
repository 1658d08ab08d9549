//! Reference module capability set.

use serde::{Deserialize, Serialize};
use shared_types::{ActionError, Address, Bytes, InitializeContext, ProfileId, Subject};
use std::fmt;

/// How a derived publication points at its original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A reply under the original.
    Comment,
    /// A new publication embedding the original.
    Quote,
    /// A re-share of the original.
    Mirror,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Comment => "comment",
            Self::Quote => "quote",
            Self::Mirror => "mirror",
        };
        f.write_str(name)
    }
}

/// Data handed to a reference hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceContext {
    /// Profile authoring the derived publication.
    pub profile_id: ProfileId,
    /// Account executing the transaction.
    pub transaction_executor: Address,
    /// The original publication being pointed at.
    pub pointed: Subject,
    /// Module-specific data.
    pub payload: Bytes,
}

impl ReferenceContext {
    /// Context with an empty payload, executed by nobody in particular.
    #[must_use]
    pub fn new(profile_id: ProfileId, pointed: Subject) -> Self {
        Self {
            profile_id,
            transaction_executor: Address::ZERO,
            pointed,
            payload: Bytes::new(),
        }
    }
}

/// Capability set of a reference module.
///
/// The hub calls the hook matching the derived publication's kind before
/// accepting it; an error rejects the publication.
pub trait ReferenceModule: Send + Sync {
    /// Called when the module is attached to an original publication.
    fn initialize(&self, ctx: &InitializeContext) -> Result<Bytes, ActionError>;

    /// Validate a comment on `ctx.pointed`.
    fn process_comment(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError>;

    /// Validate a quote of `ctx.pointed`.
    fn process_quote(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError>;

    /// Validate a mirror of `ctx.pointed`.
    fn process_mirror(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError>;

    /// Dispatch to the hook for `kind`.
    fn process_reference(&self, kind: ReferenceKind, ctx: &ReferenceContext) -> Result<Bytes, ActionError> {
        match kind {
            ReferenceKind::Comment => self.process_comment(ctx),
            ReferenceKind::Quote => self.process_quote(ctx),
            ReferenceKind::Mirror => self.process_mirror(ctx),
        }
    }
}
