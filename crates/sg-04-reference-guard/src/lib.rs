//! # SG-04 Reference Guard - Follower-Only Derived Publications
//!
//! **Subsystem ID:** 4
//!
//! ## Purpose
//!
//! Reference modules decide whether a derived publication (comment, quote,
//! mirror) may point at an original one. The follower-only module accepts a
//! derived publication only if its author follows the owner of the original.
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Acting profile must follow the pointed profile | `FollowerOnlyReferenceModule::require_follows` |
//! | Same check for all three reference kinds | `FollowerOnlyReferenceModule::process_reference` |
//! | No state is mutated | the module holds only a `FollowGraph` reader |

#![warn(clippy::all)]

pub mod follower_only;
pub mod reference;

pub use follower_only::FollowerOnlyReferenceModule;
pub use reference::{ReferenceContext, ReferenceKind, ReferenceModule};

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 4;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Reference Guard";
