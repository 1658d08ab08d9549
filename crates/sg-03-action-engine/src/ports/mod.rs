//! Ports (hexagonal boundaries) for the Action Engine.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
