//! # Follow Graph Operations
//!
//! Follow and unfollow are process-phase specializations on profile
//! subjects. Unlike collect, a profile with no follow module accepts every
//! follower.
//!
//! All preconditions of a batch are checked before the first mutation. The
//! ledger enforces "one live token per follower"; the engine only decides
//! when a ledger exists and which module to call.

use crate::ports::inbound::{FollowRequest, UnfollowRequest};
use crate::service::ActionEngine;
use crate::validation;
use shared_bus::GraphEvent;
use shared_types::{ActionError, Address, Bytes, ProcessContext, ProfileId, Subject, TimeSource, TokenId};
use tracing::{info, instrument};

impl ActionEngine {
    /// Follow every target in input order.
    ///
    /// Returns the token bound to each new edge, minted or re-used.
    #[instrument(
        skip(self, request),
        fields(follower = %request.follower_profile_id, targets = request.targets.len())
    )]
    pub fn follow(&self, caller: Address, request: FollowRequest) -> Result<Vec<TokenId>, ActionError> {
        self.require_hub(caller)?;
        self.run_frame("follow", |cell| {
            let follower = request.follower_profile_id;
            validation::validate_follow_batch(
                &request.targets,
                &request.token_ids,
                &request.payloads,
                self.config.max_batch_size,
            )?;
            for &target in &request.targets {
                validation::validate_not_self_follow(follower, target)?;
            }
            let follower_owner = validation::validate_profile_exists(&*self.directory, follower)?;
            for &target in &request.targets {
                validation::validate_profile_exists(&*self.directory, target)?;
                validation::validate_not_blocked_either_way(&*self.directory, target, follower)?;
            }

            let mut assigned = Vec::with_capacity(request.targets.len());
            let edges = request
                .targets
                .iter()
                .zip(&request.token_ids)
                .zip(&request.payloads);
            for ((&target, &token_id), payload) in edges {
                let subject = Subject::Profile(target);
                let now = self.time.now();

                let (outcome, module_id) = {
                    let mut state = cell.borrow_mut();
                    let handle = state.ensure_ledger(subject, self.config.hub, now);
                    let outcome = state.follow(
                        handle,
                        follower,
                        follower_owner,
                        request.transaction_executor,
                        token_id,
                        now,
                    )?;
                    if let Some(displaced) = outcome.displaced {
                        state.emit(GraphEvent::Unfollowed {
                            unfollower: displaced,
                            unfollowed: target,
                            token_id: outcome.token_id,
                            executor: request.transaction_executor,
                            timestamp: now,
                        });
                        info!(%displaced, followed = %target, token = %outcome.token_id, "Follower displaced");
                    }
                    (outcome, state.binding(&subject).module)
                };

                let module_result = match module_id {
                    Some(module_id) => self.resolve(module_id)?.process(&ProcessContext {
                        subject,
                        actor_profile_id: follower,
                        token_id: outcome.token_id,
                        transaction_executor: request.transaction_executor,
                        referrers: Vec::new(),
                        payload: payload.clone(),
                    })?,
                    None => Bytes::new(),
                };

                cell.borrow_mut().emit(GraphEvent::Followed {
                    follower,
                    followed: target,
                    token_id: outcome.token_id,
                    minted: outcome.minted,
                    module_input: payload.clone(),
                    module_result,
                    executor: request.transaction_executor,
                    timestamp: now,
                });
                info!(%follower, followed = %target, token = %outcome.token_id, minted = outcome.minted, "Followed");
                assigned.push(outcome.token_id);
            }
            Ok(assigned)
        })
    }

    /// Remove the unfollower's edge to every target in input order.
    ///
    /// Returns the token that was bound to each removed edge. The token
    /// itself stays with its holder and can be re-used by a later follow.
    #[instrument(
        skip(self, request),
        fields(unfollower = %request.unfollower_profile_id, targets = request.targets.len())
    )]
    pub fn unfollow(&self, caller: Address, request: UnfollowRequest) -> Result<Vec<TokenId>, ActionError> {
        self.require_hub(caller)?;
        self.run_frame("unfollow", |cell| {
            let unfollower = request.unfollower_profile_id;
            validation::validate_batch_size(request.targets.len(), self.config.max_batch_size)?;
            validation::validate_profile_exists(&*self.directory, unfollower)?;
            for &target in &request.targets {
                validation::validate_profile_exists(&*self.directory, target)?;
            }

            let mut released = Vec::with_capacity(request.targets.len());
            for &target in &request.targets {
                let mut state = cell.borrow_mut();
                let handle = state
                    .binding(&Subject::Profile(target))
                    .ledger
                    .ok_or_else(|| not_following(unfollower, target))?;
                let token_id = state.unfollow(handle, unfollower)?;

                state.emit(GraphEvent::Unfollowed {
                    unfollower,
                    unfollowed: target,
                    token_id,
                    executor: request.transaction_executor,
                    timestamp: self.time.now(),
                });
                info!(%unfollower, unfollowed = %target, token = %token_id, "Unfollowed");
                released.push(token_id);
            }
            Ok(released)
        })
    }
}

fn not_following(follower: ProfileId, followed: ProfileId) -> ActionError {
    ActionError::NotFollowing { follower, followed }
}

// =============================================================================
// TESTS
// =============================================================================
