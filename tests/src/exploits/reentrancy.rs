//! # Reentrancy Attacks
//!
//! Every module hook hands control to untrusted code that may call the
//! engine again before returning. These modules do exactly that.

use parking_lot::Mutex;
use sg_03_action_engine::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fixtures::HUB;

/// What a re-entering hook should do when triggered.
#[derive(Clone)]
pub enum Reentry {
    /// Collect the same subject again as the same actor.
    Collect,
    /// Repeat the follow that triggered the hook.
    Refollow,
    /// Follow `target` from `follower`.
    FollowOther { follower: u64, target: u64 },
    /// Unfollow the subject the hook runs for.
    UnfollowSelf,
    /// Clear the module binding of the subject.
    Detach,
}

/// Module that re-enters the engine once, records what happened, and then
/// either accepts or fails the outer call.
pub struct ReentrantModule {
    engine: Arc<ActionEngine>,
    reentry: Reentry,
    fail_outer: bool,
    armed: AtomicBool,
    /// Result of the inner call, stringified.
    pub inner: Mutex<Option<Result<String, ActionError>>>,
    /// Ledger address of the subject as observed from inside the hook.
    pub observed_ledger: Mutex<Option<Address>>,
    /// Token issued count observed from inside the hook.
    pub observed_tokens: Mutex<Option<u64>>,
}

impl ReentrantModule {
    /// Build an armed module.
    pub fn new(engine: Arc<ActionEngine>, reentry: Reentry, fail_outer: bool) -> Arc<Self> {
        Arc::new(Self {
            engine,
            reentry,
            fail_outer,
            armed: AtomicBool::new(true),
            inner: Mutex::new(None),
            observed_ledger: Mutex::new(None),
            observed_tokens: Mutex::new(None),
        })
    }

    fn attack(&self, ctx: &ProcessContext) -> Result<String, ActionError> {
        let executor = ctx.transaction_executor;
        match &self.reentry {
            Reentry::Collect => self
                .engine
                .process(
                    HUB,
                    ProcessRequest::new(ctx.subject, ctx.actor_profile_id, executor),
                )
                .map(|outcome| outcome.token_id.to_string()),
            Reentry::Refollow => self
                .engine
                .follow(
                    HUB,
                    FollowRequest::minting(
                        ctx.actor_profile_id,
                        executor,
                        vec![ctx.subject.owner_profile()],
                    ),
                )
                .map(|ids| format!("{ids:?}")),
            Reentry::FollowOther { follower, target } => self
                .engine
                .follow(
                    HUB,
                    FollowRequest::minting(
                        ProfileId(*follower),
                        crate::fixtures::owner(*follower),
                        vec![ProfileId(*target)],
                    ),
                )
                .map(|ids| format!("{ids:?}")),
            Reentry::UnfollowSelf => self
                .engine
                .unfollow(
                    HUB,
                    UnfollowRequest {
                        unfollower_profile_id: ctx.actor_profile_id,
                        transaction_executor: executor,
                        targets: vec![ctx.subject.owner_profile()],
                    },
                )
                .map(|ids| format!("{ids:?}")),
            Reentry::Detach => self
                .engine
                .initialize(HUB, ctx.subject, executor, ModuleSelector::none())
                .map(|bytes| format!("{bytes:?}")),
        }
    }
}

impl ActionModule for ReentrantModule {
    fn name(&self) -> &str {
        "reentrant"
    }

    fn initialize(&self, _ctx: &InitializeContext) -> Result<Bytes, ActionError> {
        Ok(Bytes::new())
    }

    fn process(&self, ctx: &ProcessContext) -> Result<Bytes, ActionError> {
        *self.observed_ledger.lock() = self.engine.ledger_of(&ctx.subject);
        *self.observed_tokens.lock() = Some(self.engine.tokens_issued(&ctx.subject));

        if self.armed.swap(false, Ordering::SeqCst) {
            let result = self.attack(ctx);
            *self.inner.lock() = Some(result);
        }

        if self.fail_outer {
            return Err(ActionError::ModuleRejected {
                module: Address::from_low_u8(0x66),
                reason: "attacker aborts".to_string(),
            });
        }
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use shared_bus::GraphEvent;

    const ATTACKER: ModuleId = Address::from_low_u8(0x66);

    fn armed(reentry: Reentry, fail_outer: bool, subject: Subject) -> (Harness, Arc<ReentrantModule>) {
        let harness = Harness::new();
        let module = ReentrantModule::new(harness.graph.engine.clone(), reentry, fail_outer);
        harness.install(ATTACKER, module.clone());
        harness.attach(subject, ATTACKER).unwrap();
        (harness, module)
    }

    #[test]
    fn test_reentrant_collect_sees_committed_ledger_and_token() {
        let (harness, module) = armed(Reentry::Collect, false, post());
        let mut sub = harness.subscribe();

        let outcome = harness.collect(post(), 7).unwrap();

        // Inside the outer hook the ledger already existed and token 1 was out.
        assert_eq!(outcome.token_id, TokenId(1));
        assert_eq!(module.inner.lock().clone(), Some(Ok("token#2".to_string())));
        assert_eq!(harness.engine().tokens_issued(&post()), 2);
        assert_eq!(harness.engine().stats().ledgers_deployed, 1);

        // Inner call finished first, its notification precedes the outer one.
        let events = sub.drain();
        assert_eq!(
            event_names(&events),
            vec!["LedgerDeployed", "ActionProcessed", "ActionProcessed"]
        );
        assert!(matches!(events[1], GraphEvent::ActionProcessed { token_id: TokenId(2), .. }));
        assert!(harness.engine().check_invariants().is_valid());
    }

    #[test]
    fn test_hook_observes_deployment_before_running() {
        let (harness, module) = armed(Reentry::Detach, false, post());
        harness.collect(post(), 7).unwrap();

        assert_eq!(
            *module.observed_ledger.lock(),
            Some(harness.engine().predict_ledger_address(&post()))
        );
        assert_eq!(*module.observed_tokens.lock(), Some(1));
    }

    #[test]
    fn test_reentrant_refollow_hits_duplicate_check() {
        let target = Subject::Profile(ProfileId(42));
        let (harness, module) = armed(Reentry::Refollow, false, target);

        let tokens = harness.follow(7, &[42]).unwrap();

        assert_eq!(tokens, vec![TokenId(1)]);
        assert_eq!(
            module.inner.lock().clone(),
            Some(Err(ActionError::AlreadyFollowing {
                follower: ProfileId(7),
                followed: ProfileId(42)
            }))
        );
        assert_eq!(harness.engine().tokens_issued(&target), 1);
        assert_eq!(harness.engine().stats().rolled_back_calls, 1);
        assert!(harness.engine().check_invariants().is_valid());
    }

    #[test]
    fn test_outer_failure_undoes_committed_inner_call() {
        let target = Subject::Profile(ProfileId(42));
        let (harness, module) = armed(Reentry::FollowOther { follower: 9, target: 7 }, true, target);
        let mut sub = harness.subscribe();

        let err = harness.follow(7, &[42]).unwrap_err();

        assert!(matches!(err, ActionError::ModuleRejected { .. }));
        assert_eq!(module.inner.lock().clone(), Some(Ok("[TokenId(1)]".to_string())));
        assert!(!harness.engine().is_following(ProfileId(9), ProfileId(7)));
        assert!(!harness.engine().is_following(ProfileId(7), ProfileId(42)));
        assert_eq!(harness.engine().ledger_of(&Subject::Profile(ProfileId(7))), None);
        assert_eq!(harness.engine().ledger_of(&target), None);
        assert!(sub.drain().is_empty());
        assert!(harness.engine().check_invariants().is_valid());
    }

    #[test]
    fn test_unfollow_from_inside_follow_hook() {
        let target = Subject::Profile(ProfileId(42));
        let (harness, module) = armed(Reentry::UnfollowSelf, false, target);
        let mut sub = harness.subscribe();

        harness.follow(7, &[42]).unwrap();

        // The edge existed by the time the hook ran, so the unfollow found it.
        assert_eq!(module.inner.lock().clone(), Some(Ok("[TokenId(1)]".to_string())));
        assert!(!harness.engine().is_following(ProfileId(7), ProfileId(42)));
        assert_eq!(
            event_names(&sub.drain()),
            vec!["LedgerDeployed", "Unfollowed", "Followed"]
        );
        assert!(harness.engine().check_invariants().is_valid());
    }

    #[test]
    fn test_detach_during_process_applies_after_call() {
        let (harness, module) = armed(Reentry::Detach, false, post());

        let outcome = harness.collect(post(), 7).unwrap();

        assert_eq!(outcome.token_id, TokenId(1));
        assert!(matches!(*module.inner.lock(), Some(Ok(_))));
        assert_eq!(harness.engine().module_binding(&post()).module, None);
        assert_eq!(
            harness.collect(post(), 7).unwrap_err(),
            ActionError::ActionNotInitialized(post())
        );
    }

    #[test]
    fn test_failing_outer_collect_rolls_back_everything() {
        let (harness, module) = armed(Reentry::Collect, true, post());

        assert!(harness.collect(post(), 7).is_err());

        // Inner collect failed too: it ran the same failing hook.
        assert!(matches!(*module.inner.lock(), Some(Err(_))));
        assert_eq!(harness.engine().ledger_of(&post()), None);
        assert_eq!(harness.engine().tokens_issued(&post()), 0);
        assert_eq!(harness.engine().stats().rolled_back_calls, 2);
        assert!(harness.engine().check_invariants().is_valid());
    }
}
