//! # SG-03 Action Engine - Two-Phase Module Dispatch
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! Attaches whitelisted modules to subjects (initialize), runs actions on
//! them (process, follow, unfollow), and creates each subject's relationship
//! ledger the first time it is acted on. Only the hub may call the mutating
//! entry points; the read surface is open.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Gapless token sequence per ledger | `domain/invariants.rs` - `check_token_sequence_invariant()` |
//! | INVARIANT-2 | One live edge per follower | `domain/invariants.rs` - `check_single_edge_invariant()` |
//! | INVARIANT-3 | Ledger created at most once, address never changes | `domain/state.rs` - `EngineState::ensure_ledger()` |
//! | INVARIANT-4 | Failed call leaves no trace | `domain/state.rs` - `EngineState::revert_frame()` |
//! | INVARIANT-5 | State committed before any module hook runs | `service.rs`, `follow.rs` |
//!
//! ## Default Permission
//!
//! | Operation | No module bound |
//! |-----------|-----------------|
//! | `follow` | allowed |
//! | `process` | `ActionNotInitialized` |
//!
//! ## Outbound Dependencies
//!
//! | Component | Trait | Purpose |
//! |-----------|-------|---------|
//! | Hub | `ProfileDirectory` | Profile/publication existence, owners, blocks |
//! | SG-01 | `ModuleRegistry` | Whitelist and module resolution |
//! | Bus | `EventPublisher` | Notifications |
//! | Clock | `TimeSource` | Event timestamps |
//!
//! ## Usage Example
//!
//! ```ignore
//! use sg_03_action_engine::prelude::*;
//!
//! let graph = create_in_memory_graph(EngineConfig::new(hub, governance))?;
//! graph.directory.create_profile(ProfileId(7), alice);
//! graph.directory.create_profile(ProfileId(42), bob);
//!
//! let tokens = graph.engine.follow(
//!     hub,
//!     FollowRequest::minting(ProfileId(7), alice, vec![ProfileId(42)]),
//! )?;
//! assert!(graph.engine.is_following(ProfileId(7), ProfileId(42)));
//! ```

#![warn(clippy::all)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod follow;
pub mod ports;
pub mod service;
pub mod validation;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigError, EngineConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_CALL_DEPTH};

    // Domain
    pub use crate::domain::{
        check_all_invariants, InvariantCheckResult, InvariantViolation, LedgerHandle,
        SubjectModuleState,
    };

    // Ports
    pub use crate::ports::inbound::{
        ActionEngineApi, FollowGraph, FollowRequest, ProcessOutcome, ProcessRequest,
        UnfollowRequest,
    };
    pub use crate::ports::outbound::ProfileDirectory;

    // Adapters
    pub use crate::adapters::InMemoryProfileDirectory;

    // Service
    pub use crate::service::{create_in_memory_graph, ActionEngine, EngineStats, InMemoryGraph};

    // Shared vocabulary
    pub use shared_types::{
        ActionError, ActionModule, Address, Bytes, InitializeContext, ModuleId, ModuleSelector,
        ProcessContext, ProfileId, PublicationId, Subject, TokenId,
    };
}

pub use config::{ConfigError, EngineConfig};
pub use ports::{ActionEngineApi, FollowGraph, FollowRequest, ProcessOutcome, ProcessRequest, UnfollowRequest};
pub use service::{create_in_memory_graph, ActionEngine, EngineStats, InMemoryGraph};

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 3;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Action Engine";
