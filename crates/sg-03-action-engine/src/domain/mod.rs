//! # Domain Layer (Inner Hexagon)
//!
//! Engine state, the undo journal and the invariants over them.
//! NO I/O, NO module calls: everything here runs while the state is
//! borrowed and must never hand control to outside code.

pub mod invariants;
pub mod journal;
pub mod state;

pub use invariants::*;
pub use journal::*;
pub use state::*;
