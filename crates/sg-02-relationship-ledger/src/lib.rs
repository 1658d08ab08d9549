//! # SG-02 Relationship Ledger - Per-Subject Token Ledgers
//!
//! **Subsystem ID:** 2
//!
//! ## Purpose
//!
//! A relationship ledger records who holds a relationship slot on one
//! subject: follow tokens for a profile, collect tokens for a publication.
//! The action engine creates a ledger the first time a subject is acted on
//! and reuses it for the subject's lifetime.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Token ids are 1, 2, 3, ... with no gaps or repeats | `RelationshipLedger::mint` |
//! | INVARIANT-2 | At most one live token per follower | `RelationshipLedger::follow` |
//! | INVARIANT-3 | Every mutation is exactly reversible | `RelationshipLedger::revert` |
//! | INVARIANT-4 | Ledger address is a function of deployer, kind and subject | `address::derive_ledger_address` |

#![warn(clippy::all)]

pub mod address;
pub mod ledger;

pub use address::derive_ledger_address;
pub use ledger::{FollowOutcome, LedgerChange, LedgerKind, RelationshipLedger, TokenRecord};

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Relationship Ledger";
