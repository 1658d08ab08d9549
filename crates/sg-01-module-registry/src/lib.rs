//! # SG-01 Module Registry - Governed Module Whitelist
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! Holds the set of module implementations the engine can dispatch to and
//! the governance-controlled whitelist consulted before a module is attached
//! to any subject.
//!
//! ## Policy
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Only governance toggles the whitelist | `ModuleRegistry::set_whitelisted` |
//! | Only governance hands over the role | `ModuleRegistry::set_governance` |
//! | Whitelist is checked at attach time only | `ModuleRegistry::resolve` ignores it |
//!
//! De-whitelisting a module does not detach it from subjects that already
//! hold it: those subjects keep resolving and dispatching to it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;

pub use registry::{ModuleRegistry, ModuleStatus};

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Module Registry";
