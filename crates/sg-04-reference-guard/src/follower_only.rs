//! # Follower-Only Reference Module
//!
//! Accepts a comment, quote or mirror only from profiles following the
//! owner of the original publication. Reads the follow graph, writes
//! nothing.

use crate::reference::{ReferenceContext, ReferenceKind, ReferenceModule};
use sg_03_action_engine::validation::validate_is_following;
use sg_03_action_engine::FollowGraph;
use shared_types::{ActionError, Bytes, InitializeContext, ProfileId};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Reference module gating derived publications on follow status.
pub struct FollowerOnlyReferenceModule {
    graph: Arc<dyn FollowGraph>,
}

impl FollowerOnlyReferenceModule {
    /// Create a module reading follow status from `graph`.
    pub fn new(graph: Arc<dyn FollowGraph>) -> Self {
        Self { graph }
    }

    /// Fail with `NotFollowing` unless `follower` holds a live edge to
    /// `followed`. A profile does not implicitly follow itself.
    pub fn require_follows(&self, follower: ProfileId, followed: ProfileId) -> Result<(), ActionError> {
        validate_is_following(self.graph.as_ref(), follower, followed)
    }

    #[instrument(skip(self, ctx), fields(author = %ctx.profile_id, pointed = %ctx.pointed))]
    fn guard(&self, kind: ReferenceKind, ctx: &ReferenceContext) -> Result<Bytes, ActionError> {
        let followed = ctx.pointed.owner_profile();
        if let Err(error) = self.require_follows(ctx.profile_id, followed) {
            warn!(%kind, %error, "Reference rejected");
            return Err(error);
        }
        debug!(%kind, "Reference accepted");
        Ok(Bytes::new())
    }
}

impl ReferenceModule for FollowerOnlyReferenceModule {
    fn initialize(&self, _ctx: &InitializeContext) -> Result<Bytes, ActionError> {
        Ok(Bytes::new())
    }

    fn process_comment(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError> {
        self.guard(ReferenceKind::Comment, ctx)
    }

    fn process_quote(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError> {
        self.guard(ReferenceKind::Quote, ctx)
    }

    fn process_mirror(&self, ctx: &ReferenceContext) -> Result<Bytes, ActionError> {
        self.guard(ReferenceKind::Mirror, ctx)
    }
}

// =============================================================================
// TESTS
// =============================================================================
