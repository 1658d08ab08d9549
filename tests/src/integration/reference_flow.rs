//! # Reference Flow
//!
//! The follower-only reference module reading the live engine, and a collect
//! module that consults the same guard from inside its processing hook.

use sg_03_action_engine::prelude::*;
use sg_04_reference_guard::FollowerOnlyReferenceModule;
use std::sync::Arc;

/// Collect module that only lets followers of the publication's owner
/// collect. Reads the engine from inside the hook.
pub struct FollowersOnlyCollect {
    guard: FollowerOnlyReferenceModule,
}

impl FollowersOnlyCollect {
    /// Gate on follow status read from `graph`.
    pub fn new(graph: Arc<dyn FollowGraph>) -> Self {
        Self {
            guard: FollowerOnlyReferenceModule::new(graph),
        }
    }
}

impl ActionModule for FollowersOnlyCollect {
    fn name(&self) -> &str {
        "followers-only-collect"
    }

    fn initialize(&self, _ctx: &InitializeContext) -> Result<Bytes, ActionError> {
        Ok(Bytes::new())
    }

    fn process(&self, ctx: &ProcessContext) -> Result<Bytes, ActionError> {
        self.guard
            .require_follows(ctx.actor_profile_id, ctx.subject.owner_profile())?;
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use sg_04_reference_guard::{ReferenceContext, ReferenceKind, ReferenceModule};

    const GATED: ModuleId = Address::from_low_u8(0x40);

    #[test]
    fn test_comment_quote_mirror_require_following() {
        let harness = Harness::new();
        let guard = FollowerOnlyReferenceModule::new(harness.graph.engine.clone());
        let ctx = ReferenceContext::new(ProfileId(7), post());

        for kind in [ReferenceKind::Comment, ReferenceKind::Quote, ReferenceKind::Mirror] {
            assert_eq!(
                guard.process_reference(kind, &ctx).unwrap_err(),
                ActionError::NotFollowing {
                    follower: ProfileId(7),
                    followed: ProfileId(42)
                }
            );
        }

        harness.follow(7, &[42]).unwrap();
        for kind in [ReferenceKind::Comment, ReferenceKind::Quote, ReferenceKind::Mirror] {
            assert!(guard.process_reference(kind, &ctx).is_ok());
        }

        harness.unfollow(7, &[42]).unwrap();
        assert!(guard.process_comment(&ctx).is_err());
    }

    #[test]
    fn test_guard_is_read_only() {
        let harness = Harness::new();
        harness.follow(7, &[42]).unwrap();
        let before = harness.engine().stats();

        let guard = FollowerOnlyReferenceModule::new(harness.graph.engine.clone());
        guard.require_follows(ProfileId(7), ProfileId(42)).unwrap();

        assert_eq!(harness.engine().stats(), before);
        assert_eq!(harness.engine().follower_count(ProfileId(42)), 1);
    }

    #[test]
    fn test_followers_only_collect_reads_engine_mid_call() {
        let harness = Harness::new();
        harness.install(GATED, Arc::new(FollowersOnlyCollect::new(harness.graph.engine.clone())));
        harness.attach(post(), GATED).unwrap();

        let err = harness.collect(post(), 9).unwrap_err();
        assert!(matches!(err, ActionError::NotFollowing { .. }));
        assert_eq!(harness.engine().ledger_of(&post()), None);

        harness.follow(9, &[42]).unwrap();
        assert_eq!(harness.collect(post(), 9).unwrap().token_id, TokenId(1));
    }
}
