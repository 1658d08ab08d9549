//! # Follow Flow
//!
//! Profile 7 follows profile 42 through the engine, against the real ledger.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use sg_03_action_engine::prelude::*;
    use shared_bus::GraphEvent;

    #[test]
    fn test_first_follow_deploys_then_follows() {
        let harness = Harness::new();
        let mut sub = harness.subscribe();
        let target = Subject::Profile(ProfileId(42));

        let tokens = harness.follow(7, &[42]).unwrap();

        assert_eq!(tokens, vec![TokenId(1)]);
        assert_eq!(harness.engine().token_holder(&target, TokenId(1)), Some(ALICE));
        let events = sub.drain();
        assert_eq!(event_names(&events), vec!["LedgerDeployed", "Followed"]);
        assert_eq!(
            events[0],
            GraphEvent::LedgerDeployed {
                subject: target,
                ledger: harness.engine().predict_ledger_address(&target),
                timestamp: 1_000,
            }
        );
    }

    #[test]
    fn test_second_follow_goes_through_ledger_duplicate_check() {
        let harness = Harness::new();
        harness.follow(7, &[42]).unwrap();
        let ledger = harness.engine().ledger_of(&Subject::Profile(ProfileId(42)));

        let err = harness.follow(7, &[42]).unwrap_err();

        assert_eq!(
            err,
            ActionError::AlreadyFollowing {
                follower: ProfileId(7),
                followed: ProfileId(42)
            }
        );
        assert_eq!(harness.engine().tokens_issued(&Subject::Profile(ProfileId(42))), 1);
        assert_eq!(harness.engine().ledger_of(&Subject::Profile(ProfileId(42))), ledger);
    }

    #[test]
    fn test_ledger_address_never_changes() {
        let harness = Harness::new();
        let target = Subject::Profile(ProfileId(42));

        harness.follow(7, &[42]).unwrap();
        let first = harness.engine().ledger_of(&target);
        harness.unfollow(7, &[42]).unwrap();
        harness.follow(9, &[42]).unwrap();
        harness.follow(7, &[42]).unwrap();

        assert_eq!(harness.engine().ledger_of(&target), first);
        assert_eq!(harness.engine().stats().ledgers_deployed, 1);
        assert_eq!(harness.engine().tokens_issued(&target), 3);
    }

    #[test]
    fn test_self_follow_always_fails() {
        let harness = Harness::new();
        harness.follow(7, &[42]).unwrap();

        for targets in [&[7u64][..], &[9, 7], &[7, 9]] {
            assert_eq!(
                harness.follow(7, targets).unwrap_err(),
                ActionError::SelfFollow(ProfileId(7))
            );
        }
        assert_eq!(harness.engine().follower_count(ProfileId(9)), 0);
    }

    #[test]
    fn test_mismatch_causes_no_state_change() {
        let harness = Harness::new();
        let mut sub = harness.subscribe();
        let request = FollowRequest {
            follower_profile_id: ProfileId(7),
            transaction_executor: ALICE,
            targets: vec![ProfileId(42)],
            token_ids: vec![TokenId::NONE, TokenId::NONE],
            payloads: vec![Bytes::new()],
        };

        let err = harness.engine().follow(HUB, request).unwrap_err();

        assert!(matches!(err, ActionError::ArrayMismatch { .. }));
        assert_eq!(harness.engine().ledger_of(&Subject::Profile(ProfileId(42))), None);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_unfollow_exactly_once() {
        let harness = Harness::new();
        let not_following = ActionError::NotFollowing {
            follower: ProfileId(7),
            followed: ProfileId(42),
        };

        assert_eq!(harness.unfollow(7, &[42]).unwrap_err(), not_following);
        harness.follow(7, &[42]).unwrap();
        assert_eq!(harness.unfollow(7, &[42]).unwrap(), vec![TokenId(1)]);
        assert_eq!(harness.unfollow(7, &[42]).unwrap_err(), not_following);
    }

    #[test]
    fn test_refollow_after_unfollow_mints_next_id() {
        let harness = Harness::new();
        harness.follow(7, &[42]).unwrap();
        harness.unfollow(7, &[42]).unwrap();

        assert_eq!(harness.follow(7, &[42]).unwrap(), vec![TokenId(2)]);
        // The old token stays with Alice, unbound.
        assert_eq!(
            harness.engine().token_holder(&Subject::Profile(ProfileId(42)), TokenId(1)),
            Some(ALICE)
        );
    }

    #[test]
    fn test_multi_target_returns_ids_in_input_order() {
        let harness = Harness::new();
        harness.follow(9, &[42]).unwrap();

        let tokens = harness.follow(7, &[42, 9]).unwrap();

        assert_eq!(tokens, vec![TokenId(2), TokenId(1)]);
        assert!(harness.engine().is_following(ProfileId(7), ProfileId(9)));
        assert_eq!(harness.engine().follow_token_id(ProfileId(7), ProfileId(42)), Some(TokenId(2)));
    }

    #[test]
    fn test_non_hub_follow_rejected() {
        let harness = Harness::new();
        let err = harness
            .engine()
            .follow(
                MALLORY,
                FollowRequest::minting(ProfileId(7), ALICE, vec![ProfileId(42)]),
            )
            .unwrap_err();

        assert_eq!(err, ActionError::NotHub { caller: MALLORY });
        assert_eq!(harness.engine().stats().rejected_calls, 1);
    }

    #[test]
    fn test_invariants_hold_after_mixed_activity() {
        let harness = Harness::new();
        harness.follow(7, &[42, 9]).unwrap();
        harness.follow(9, &[42]).unwrap();
        harness.unfollow(7, &[9]).unwrap();
        let _ = harness.follow(7, &[7]);

        assert!(harness.engine().check_invariants().is_valid());
    }
}
