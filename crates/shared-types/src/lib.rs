//! # Shared Types Crate
//!
//! Identifiers, the `ActionError` taxonomy and the `ActionModule` capability
//! trait used by every Social-Graph crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Opaque Payloads**: `Bytes` travels between the hub and modules without
//!   being interpreted by the engine.
//! - **One Taxonomy**: Every failure is an `ActionError` and aborts the call.

pub mod entities;
pub mod errors;
pub mod module_trait;
pub mod time;

pub use entities::*;
pub use errors::*;
pub use module_trait::*;
pub use time::*;
