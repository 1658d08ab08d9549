//! # Graph Properties
//!
//! Random follow/unfollow sequences run against the engine and a plain set
//! model side by side. After every step the engine must agree with the
//! model, failed batches must leave no trace, and the structural
//! invariants must hold.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use proptest::prelude::*;
    use sg_03_action_engine::prelude::*;
    use std::collections::{BTreeMap, BTreeSet};

    const IDS: [u64; 3] = [7, 42, 9];

    #[derive(Debug, Clone)]
    enum Op {
        Follow { follower: u64, targets: Vec<u64> },
        Unfollow { unfollower: u64, targets: Vec<u64> },
    }

    fn profile() -> impl Strategy<Value = u64> + Clone {
        prop::sample::select(IDS.to_vec())
    }

    fn op() -> impl Strategy<Value = Op> {
        let targets = prop::collection::vec(profile(), 1..3);
        prop_oneof![
            (profile(), targets.clone())
                .prop_map(|(follower, targets)| Op::Follow { follower, targets }),
            (profile(), targets)
                .prop_map(|(unfollower, targets)| Op::Unfollow { unfollower, targets }),
        ]
    }

    /// Reference model: live edges, per-target issued counts, deployed ledgers.
    #[derive(Debug, Clone, Default)]
    struct Model {
        edges: BTreeMap<(u64, u64), u64>,
        issued: BTreeMap<u64, u64>,
        deployed: BTreeSet<u64>,
    }

    impl Model {
        /// Apply `op` all-or-nothing, returning the expected token ids.
        fn apply(&mut self, op: &Op) -> Option<Vec<u64>> {
            let mut next = self.clone();
            let mut tokens = Vec::new();
            match op {
                Op::Follow { follower, targets } => {
                    for &target in targets {
                        if *follower == target || next.edges.contains_key(&(*follower, target)) {
                            return None;
                        }
                        next.deployed.insert(target);
                        let issued = next.issued.entry(target).or_default();
                        *issued += 1;
                        next.edges.insert((*follower, target), *issued);
                        tokens.push(*issued);
                    }
                }
                Op::Unfollow { unfollower, targets } => {
                    for &target in targets {
                        tokens.push(next.edges.remove(&(*unfollower, target))?);
                    }
                }
            }
            *self = next;
            Some(tokens)
        }
    }

    fn run(harness: &Harness, op: &Op) -> Result<Vec<TokenId>, ActionError> {
        match op {
            Op::Follow { follower, targets } => harness.follow(*follower, targets),
            Op::Unfollow { unfollower, targets } => harness.unfollow(*unfollower, targets),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_engine_matches_set_model(ops in prop::collection::vec(op(), 1..24)) {
            let harness = Harness::new();
            let engine = harness.engine();
            let mut model = Model::default();

            for op in &ops {
                let before = engine.stats();
                let expected = model.apply(op);
                let actual = run(&harness, op);

                match (expected, actual) {
                    (Some(expected), Ok(actual)) => {
                        let actual: Vec<u64> = actual.iter().map(|token| token.0).collect();
                        prop_assert_eq!(expected, actual);
                    }
                    (None, Err(_)) => {
                        let after = engine.stats();
                        prop_assert_eq!(before.follows, after.follows);
                        prop_assert_eq!(before.unfollows, after.unfollows);
                        prop_assert_eq!(before.ledgers_deployed, after.ledgers_deployed);
                        prop_assert_eq!(before.rolled_back_calls + 1, after.rolled_back_calls);
                    }
                    (expected, actual) => {
                        prop_assert!(false, "{:?}: model {:?}, engine {:?}", op, expected, actual);
                    }
                }

                for follower in IDS {
                    for followed in IDS {
                        let edge = model.edges.get(&(follower, followed)).copied().map(TokenId);
                        prop_assert_eq!(
                            engine.follow_token_id(ProfileId(follower), ProfileId(followed)),
                            edge
                        );
                    }
                }
                for target in IDS {
                    let subject = Subject::Profile(ProfileId(target));
                    let issued = model.issued.get(&target).copied().unwrap_or(0);
                    prop_assert_eq!(engine.tokens_issued(&subject), issued);
                    prop_assert_eq!(
                        engine.ledger_of(&subject).is_some(),
                        model.deployed.contains(&target)
                    );
                }
                prop_assert_eq!(engine.stats().ledgers_deployed, model.deployed.len() as u64);
                prop_assert!(engine.check_invariants().is_valid());
            }
        }

        #[test]
        fn prop_ledger_address_is_stable(ops in prop::collection::vec(op(), 1..16)) {
            let harness = Harness::new();
            let engine = harness.engine();
            let predicted: Vec<Address> = IDS
                .iter()
                .map(|id| engine.predict_ledger_address(&Subject::Profile(ProfileId(*id))))
                .collect();

            for op in &ops {
                let _ = run(&harness, op);
                for (id, address) in IDS.iter().zip(&predicted) {
                    if let Some(deployed) = engine.ledger_of(&Subject::Profile(ProfileId(*id))) {
                        prop_assert_eq!(deployed, *address);
                    }
                }
            }
        }

        #[test]
        fn prop_collect_ids_are_gapless(actors in prop::collection::vec(profile(), 1..20)) {
            let harness = Harness::new();
            harness.install(ECHO_MODULE, std::sync::Arc::new(EchoModule::default()));
            harness.attach(post(), ECHO_MODULE).expect("attach");

            for (index, actor) in actors.iter().enumerate() {
                let outcome = harness.collect(post(), *actor).expect("collect");
                prop_assert_eq!(outcome.token_id, TokenId(index as u64 + 1));
                prop_assert_eq!(
                    harness.engine().token_holder(&post(), outcome.token_id),
                    Some(owner(*actor))
                );
            }
            prop_assert_eq!(harness.engine().tokens_issued(&post()), actors.len() as u64);
        }
    }
}
