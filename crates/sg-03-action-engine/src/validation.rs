//! # Validation Library
//!
//! Stateless precondition checks shared by every engine operation and by
//! reference-type modules. Each check reads through a port and either
//! passes or returns the error the caller propagates unchanged.

use crate::ports::{FollowGraph, ProfileDirectory};
use shared_types::{ActionError, Address, Bytes, ProfileId, PublicationId, Subject, TokenId};

/// Asserts `profile` exists and returns its owner.
pub fn validate_profile_exists(
    directory: &dyn ProfileDirectory,
    profile: ProfileId,
) -> Result<Address, ActionError> {
    directory
        .owner_of(profile)
        .ok_or(ActionError::ProfileDoesNotExist(profile))
}

/// Asserts `publication` exists under `profile`.
pub fn validate_publication_exists(
    directory: &dyn ProfileDirectory,
    profile: ProfileId,
    publication: PublicationId,
) -> Result<(), ActionError> {
    validate_profile_exists(directory, profile)?;
    if !directory.publication_exists(profile, publication) {
        return Err(ActionError::PublicationDoesNotExist {
            profile,
            publication,
        });
    }
    Ok(())
}

/// Asserts `subject` exists, whichever kind it is.
pub fn validate_subject_exists(
    directory: &dyn ProfileDirectory,
    subject: &Subject,
) -> Result<(), ActionError> {
    match *subject {
        Subject::Profile(profile) => validate_profile_exists(directory, profile).map(|_| ()),
        Subject::Publication {
            profile,
            publication,
        } => validate_publication_exists(directory, profile, publication),
    }
}

/// Asserts `blocker` has not blocked `blocked`.
pub fn validate_not_blocked(
    directory: &dyn ProfileDirectory,
    blocker: ProfileId,
    blocked: ProfileId,
) -> Result<(), ActionError> {
    if directory.is_blocked(blocker, blocked) {
        return Err(ActionError::Blocked { blocker, blocked });
    }
    Ok(())
}

/// Asserts neither profile has blocked the other.
pub fn validate_not_blocked_either_way(
    directory: &dyn ProfileDirectory,
    a: ProfileId,
    b: ProfileId,
) -> Result<(), ActionError> {
    validate_not_blocked(directory, a, b)?;
    validate_not_blocked(directory, b, a)
}

/// Asserts a profile is not trying to follow itself.
pub fn validate_not_self_follow(follower: ProfileId, target: ProfileId) -> Result<(), ActionError> {
    if follower == target {
        return Err(ActionError::SelfFollow(follower));
    }
    Ok(())
}

/// Asserts a live follow edge from `follower` to `followed`.
pub fn validate_is_following(
    graph: &dyn FollowGraph,
    follower: ProfileId,
    followed: ProfileId,
) -> Result<(), ActionError> {
    if !graph.is_following(follower, followed) {
        return Err(ActionError::NotFollowing { follower, followed });
    }
    Ok(())
}

/// Asserts every referrer exists and differs from the acted-on subject.
pub fn validate_referrers(
    directory: &dyn ProfileDirectory,
    subject: &Subject,
    referrers: &[Subject],
) -> Result<(), ActionError> {
    for referrer in referrers {
        if referrer == subject {
            return Err(ActionError::InvalidReferrer(*referrer));
        }
        validate_subject_exists(directory, referrer).map_err(|_| ActionError::InvalidReferrer(*referrer))?;
    }
    Ok(())
}

/// Asserts the parallel follow inputs have one entry per target and stay
/// within the batch limit.
pub fn validate_follow_batch(
    targets: &[ProfileId],
    token_ids: &[TokenId],
    payloads: &[Bytes],
    max_batch_size: usize,
) -> Result<(), ActionError> {
    if targets.len() != token_ids.len() || targets.len() != payloads.len() {
        return Err(ActionError::ArrayMismatch {
            targets: targets.len(),
            token_ids: token_ids.len(),
            payloads: payloads.len(),
        });
    }
    validate_batch_size(targets.len(), max_batch_size)
}

/// Asserts `size` does not exceed `max`.
pub fn validate_batch_size(size: usize, max: usize) -> Result<(), ActionError> {
    if size > max {
        return Err(ActionError::BatchTooLarge { size, max });
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
