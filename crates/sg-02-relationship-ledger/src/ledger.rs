//! # Relationship Ledger
//!
//! One ledger per subject. Issues relationship tokens in strictly increasing
//! order starting at 1 and tracks who holds each one. Follow ledgers also
//! bind tokens to follower profiles: at most one live token per follower.
//!
//! Every mutation returns a [`LedgerChange`] that [`RelationshipLedger::revert`]
//! undoes exactly. Changes must be reverted in reverse order of creation.

use crate::address::derive_ledger_address;
use serde::{Deserialize, Serialize};
use shared_types::{ActionError, Address, ProfileId, Subject, Timestamp, TokenId};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// What a ledger tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerKind {
    /// Follow tokens for a profile.
    Follow,
    /// Collect tokens for a publication.
    Collect,
}

impl LedgerKind {
    /// Kind matching a subject: profiles are followed, publications collected.
    #[must_use]
    pub const fn for_subject(subject: &Subject) -> Self {
        match subject {
            Subject::Profile(_) => Self::Follow,
            Subject::Publication { .. } => Self::Collect,
        }
    }

    /// Tag byte used in address derivation.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Follow => 0x01,
            Self::Collect => 0x02,
        }
    }
}

/// State of one issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Account holding the token.
    pub holder: Address,
    /// Follower profile the token is bound to (follow ledgers only).
    pub follower: Option<ProfileId>,
    /// When the token was issued or last bound.
    pub bound_at: Timestamp,
}

/// Reversible record of a single ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    /// A new token was issued.
    Issued {
        token_id: TokenId,
        follower: Option<ProfileId>,
    },
    /// An existing token was re-bound to a new follower.
    Rebound {
        token_id: TokenId,
        follower: ProfileId,
        previous: TokenRecord,
    },
    /// A follower's token was unbound.
    Unbound {
        token_id: TokenId,
        follower: ProfileId,
    },
}

/// Result of a successful follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowOutcome {
    /// Token now bound to the follower.
    pub token_id: TokenId,
    /// True if the token was freshly minted.
    pub minted: bool,
    /// Follower whose edge was removed because their token was re-bound.
    pub displaced: Option<ProfileId>,
    /// Undo record.
    pub change: LedgerChange,
}

/// Per-subject token ledger.
#[derive(Debug, Clone)]
pub struct RelationshipLedger {
    subject: Subject,
    kind: LedgerKind,
    address: Address,
    /// Last issued id. The next token is `last_token_id + 1`.
    last_token_id: u64,
    tokens: BTreeMap<TokenId, TokenRecord>,
    /// Live follow edges: follower -> bound token.
    follower_tokens: HashMap<ProfileId, TokenId>,
}

impl RelationshipLedger {
    /// Creates an empty ledger for `subject`, deployed by `deployer`.
    #[must_use]
    pub fn new(deployer: Address, subject: Subject) -> Self {
        let kind = LedgerKind::for_subject(&subject);
        Self {
            subject,
            kind,
            address: derive_ledger_address(deployer, kind, &subject),
            last_token_id: 0,
            tokens: BTreeMap::new(),
            follower_tokens: HashMap::new(),
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Subject this ledger belongs to.
    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// Ledger kind.
    #[must_use]
    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    /// Ledger address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of tokens ever issued (also the highest id).
    #[must_use]
    pub fn tokens_issued(&self) -> u64 {
        self.last_token_id
    }

    /// Record of `token_id`, if issued.
    #[must_use]
    pub fn token(&self, token_id: TokenId) -> Option<&TokenRecord> {
        self.tokens.get(&token_id)
    }

    /// Holder of `token_id`, if issued.
    #[must_use]
    pub fn holder_of(&self, token_id: TokenId) -> Option<Address> {
        self.tokens.get(&token_id).map(|t| t.holder)
    }

    /// Token bound to `follower`, if they follow this subject.
    #[must_use]
    pub fn follower_token(&self, follower: ProfileId) -> Option<TokenId> {
        self.follower_tokens.get(&follower).copied()
    }

    /// True if `follower` holds a live token.
    #[must_use]
    pub fn is_following(&self, follower: ProfileId) -> bool {
        self.follower_tokens.contains_key(&follower)
    }

    /// Number of live follow edges.
    #[must_use]
    pub fn follower_count(&self) -> usize {
        self.follower_tokens.len()
    }

    /// Issued token ids in ascending order.
    pub fn token_ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.tokens.keys().copied()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    fn mint(&mut self, holder: Address, follower: Option<ProfileId>, now: Timestamp) -> TokenId {
        self.last_token_id += 1;
        let token_id = TokenId(self.last_token_id);
        self.tokens.insert(
            token_id,
            TokenRecord {
                holder,
                follower,
                bound_at: now,
            },
        );
        if let Some(follower) = follower {
            self.follower_tokens.insert(follower, token_id);
        }
        token_id
    }

    /// Issue a new token to `recipient` (collect path).
    pub fn issue(&mut self, recipient: Address, now: Timestamp) -> (TokenId, LedgerChange) {
        let token_id = self.mint(recipient, None, now);
        debug!(subject = %self.subject, token = %token_id, "Token issued");
        (
            token_id,
            LedgerChange::Issued {
                token_id,
                follower: None,
            },
        )
    }

    /// Create a follow edge for `follower`.
    ///
    /// With `TokenId::NONE` a new token is minted to `follower_owner`.
    /// Otherwise the existing token is re-bound: it must exist and be held by
    /// `follower_owner` or `executor`. If it is still bound to another
    /// follower, that follower loses their edge.
    pub fn follow(
        &mut self,
        follower: ProfileId,
        follower_owner: Address,
        executor: Address,
        token_id: TokenId,
        now: Timestamp,
    ) -> Result<FollowOutcome, ActionError> {
        let followed = self.subject.owner_profile();
        if self.is_following(follower) {
            return Err(ActionError::AlreadyFollowing { follower, followed });
        }

        if token_id.is_none() {
            let token_id = self.mint(follower_owner, Some(follower), now);
            debug!(subject = %self.subject, token = %token_id, %follower, "Follow token minted");
            return Ok(FollowOutcome {
                token_id,
                minted: true,
                displaced: None,
                change: LedgerChange::Issued {
                    token_id,
                    follower: Some(follower),
                },
            });
        }

        let record = self
            .tokens
            .get_mut(&token_id)
            .ok_or(ActionError::FollowTokenDoesNotExist(token_id))?;
        if record.holder != follower_owner && record.holder != executor {
            return Err(ActionError::NotTokenHolder {
                token: token_id,
                holder: record.holder,
            });
        }

        let previous = record.clone();
        record.holder = follower_owner;
        record.follower = Some(follower);
        record.bound_at = now;

        let displaced = previous.follower;
        if let Some(displaced) = displaced {
            self.follower_tokens.remove(&displaced);
        }
        self.follower_tokens.insert(follower, token_id);
        debug!(subject = %self.subject, token = %token_id, %follower, ?displaced, "Follow token re-bound");

        Ok(FollowOutcome {
            token_id,
            minted: false,
            displaced,
            change: LedgerChange::Rebound {
                token_id,
                follower,
                previous,
            },
        })
    }

    /// Remove `unfollower`'s edge. The token stays with its holder, unbound.
    pub fn unfollow(&mut self, unfollower: ProfileId) -> Result<(TokenId, LedgerChange), ActionError> {
        let token_id = self
            .follower_tokens
            .remove(&unfollower)
            .ok_or(ActionError::NotFollowing {
                follower: unfollower,
                followed: self.subject.owner_profile(),
            })?;
        if let Some(record) = self.tokens.get_mut(&token_id) {
            record.follower = None;
        }
        debug!(subject = %self.subject, token = %token_id, %unfollower, "Follow token unbound");
        Ok((
            token_id,
            LedgerChange::Unbound {
                token_id,
                follower: unfollower,
            },
        ))
    }

    /// Undo `change`. Must be the most recent change not yet reverted.
    pub fn revert(&mut self, change: LedgerChange) {
        match change {
            LedgerChange::Issued { token_id, follower } => {
                debug_assert_eq!(token_id.0, self.last_token_id, "issuance reverted out of order");
                self.tokens.remove(&token_id);
                self.last_token_id -= 1;
                if let Some(follower) = follower {
                    self.follower_tokens.remove(&follower);
                }
            }
            LedgerChange::Rebound {
                token_id,
                follower,
                previous,
            } => {
                self.follower_tokens.remove(&follower);
                if let Some(displaced) = previous.follower {
                    self.follower_tokens.insert(displaced, token_id);
                }
                self.tokens.insert(token_id, previous);
            }
            LedgerChange::Unbound { token_id, follower } => {
                if let Some(record) = self.tokens.get_mut(&token_id) {
                    record.follower = Some(follower);
                }
                self.follower_tokens.insert(follower, token_id);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
