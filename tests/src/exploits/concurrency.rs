//! # Racing Callers
//!
//! Calls from several threads serialize on the execution gate. Lazy
//! deployment must still happen once per subject and token ids must stay
//! gapless.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use sg_03_action_engine::prelude::*;
    use std::sync::Arc;
    use std::thread;

    const FOLLOWERS: u64 = 32;

    fn crowd() -> Harness {
        let harness = Harness::new();
        for id in 100..100 + FOLLOWERS {
            harness
                .graph
                .directory
                .create_profile(ProfileId(id), Address::from_low_u8(id as u8));
        }
        harness
    }

    #[test]
    fn test_parallel_first_follows_deploy_once() {
        let harness = crowd();
        let engine = harness.graph.engine.clone();

        let handles: Vec<_> = (100..100 + FOLLOWERS)
            .map(|id| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    engine.follow(
                        HUB,
                        FollowRequest::minting(
                            ProfileId(id),
                            Address::from_low_u8(id as u8),
                            vec![ProfileId(42)],
                        ),
                    )
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread").expect("follow"))
            .map(|tokens| tokens[0].0)
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, (1..=FOLLOWERS).collect::<Vec<_>>());
        assert_eq!(engine.stats().ledgers_deployed, 1);
        assert_eq!(engine.follower_count(ProfileId(42)), FOLLOWERS as usize);
        assert!(engine.check_invariants().is_valid());
    }

    #[test]
    fn test_parallel_collects_and_follows_interleave_cleanly() {
        let harness = crowd();
        let module = Arc::new(EchoModule::default());
        harness.install(ECHO_MODULE, module.clone());
        harness.attach(post(), ECHO_MODULE).unwrap();
        let engine = harness.graph.engine.clone();

        thread::scope(|scope| {
            for id in 100..100 + FOLLOWERS {
                let engine = &engine;
                scope.spawn(move || {
                    let owner = Address::from_low_u8(id as u8);
                    engine
                        .process(HUB, ProcessRequest::new(post(), ProfileId(id), owner))
                        .expect("collect");
                    engine
                        .follow(HUB, FollowRequest::minting(ProfileId(id), owner, vec![ProfileId(7)]))
                        .expect("follow");
                });
            }
        });

        assert_eq!(engine.tokens_issued(&post()), FOLLOWERS);
        assert_eq!(engine.tokens_issued(&Subject::Profile(ProfileId(7))), FOLLOWERS);
        assert_eq!(module.processed(), FOLLOWERS as usize);
        assert_eq!(engine.stats().ledgers_deployed, 2);
        assert!(engine.check_invariants().is_valid());
    }
}
