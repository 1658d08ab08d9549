//! # Domain Invariants
//!
//! Structural invariants over the engine state. Checked by tests and
//! available at runtime through `ActionEngine::check_invariants`.
//!
//! - INVARIANT-1: Gapless Token Sequence
//! - INVARIANT-2: One Live Edge Per Follower
//! - INVARIANT-3: Ledger Bound Exactly Once
//! - INVARIANT-4: Idle Engine Holds No Frames

use crate::domain::state::EngineState;
use sg_02_relationship_ledger::RelationshipLedger;
use shared_types::{Address, ProfileId, Subject, TokenId};
use std::collections::HashMap;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// INVARIANT-1: Gapless Token Sequence
///
/// Issued ids are exactly `1..=tokens_issued`.
#[must_use]
pub fn check_token_sequence_invariant(ledger: &RelationshipLedger) -> bool {
    ledger
        .token_ids()
        .map(|id| id.0)
        .eq(1..=ledger.tokens_issued())
}

/// INVARIANT-2: One Live Edge Per Follower
///
/// Every token bound to a follower is that follower's registered token,
/// and nothing else is registered.
#[must_use]
pub fn check_single_edge_invariant(ledger: &RelationshipLedger) -> bool {
    let mut bound = 0usize;
    for token_id in ledger.token_ids() {
        let Some(follower) = ledger.token(token_id).and_then(|record| record.follower) else {
            continue;
        };
        if ledger.follower_token(follower) != Some(token_id) {
            return false;
        }
        bound += 1;
    }
    bound == ledger.follower_count()
}

/// INVARIANT-3: Ledger Bound Exactly Once
///
/// Every subject handle points at a ledger for that subject with the
/// recorded address, and every ledger is referenced by exactly one subject.
#[must_use]
pub fn check_ledger_binding_invariant(state: &EngineState) -> bool {
    let mut references = vec![0usize; state.ledgers().len()];
    for (subject, record) in state.subjects() {
        let Some(handle) = record.ledger else {
            continue;
        };
        let Some(ledger) = state.ledgers().get(handle.index) else {
            return false;
        };
        if ledger.subject() != *subject || ledger.address() != handle.address {
            return false;
        }
        references[handle.index] += 1;
    }
    references.iter().all(|count| *count == 1)
}

/// INVARIANT-4: Idle Engine Holds No Frames
///
/// Between top-level calls nothing is in flight.
#[must_use]
pub fn check_idle_invariant(state: &EngineState) -> bool {
    state.depth() == 0 && state.journal_len() == 0
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(state: &EngineState) -> InvariantCheckResult {
    let mut violations = Vec::new();

    for ledger in state.ledgers() {
        if !check_token_sequence_invariant(ledger) {
            violations.push(InvariantViolation::TokenSequenceGap {
                subject: ledger.subject(),
                issued: ledger.tokens_issued(),
            });
        }
        if !check_single_edge_invariant(ledger) {
            violations.push(InvariantViolation::DanglingEdge {
                subject: ledger.subject(),
            });
        }
    }

    if !check_ledger_binding_invariant(state) {
        violations.push(InvariantViolation::LedgerBindingBroken);
    }

    if !check_idle_invariant(state) {
        violations.push(InvariantViolation::FrameLeaked {
            depth: state.depth(),
            journal: state.journal_len(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

/// Duplicate addresses across ledgers, if any. Distinct subjects must never
/// share a ledger address.
#[must_use]
pub fn find_address_collisions(state: &EngineState) -> Vec<(Address, Vec<Subject>)> {
    let mut by_address: HashMap<Address, Vec<Subject>> = HashMap::new();
    for ledger in state.ledgers() {
        by_address
            .entry(ledger.address())
            .or_default()
            .push(ledger.subject());
    }
    by_address
        .into_iter()
        .filter(|(_, subjects)| subjects.len() > 1)
        .collect()
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Token ids are not `1..=issued`.
    TokenSequenceGap { subject: Subject, issued: u64 },
    /// Follower index disagrees with token records.
    DanglingEdge { subject: Subject },
    /// A subject handle is stale or a ledger is shared or orphaned.
    LedgerBindingBroken,
    /// Frames or journal entries survived a completed call.
    FrameLeaked { depth: u32, journal: usize },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenSequenceGap { subject, issued } => {
                write!(f, "token sequence of {subject} is not 1..={issued}")
            }
            Self::DanglingEdge { subject } => {
                write!(f, "follower index of {subject} disagrees with token records")
            }
            Self::LedgerBindingBroken => write!(f, "ledger arena and subject table disagree"),
            Self::FrameLeaked { depth, journal } => {
                write!(f, "idle engine at depth {depth} with {journal} journal entries")
            }
        }
    }
}

/// Helper for tests: the token a follower holds on `followed`'s ledger.
#[must_use]
pub fn live_edge(state: &EngineState, follower: ProfileId, followed: ProfileId) -> Option<TokenId> {
    state
        .ledger_of(&Subject::Profile(followed))?
        .follower_token(follower)
}

// =============================================================================
// TESTS
// =============================================================================
