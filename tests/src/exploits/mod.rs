//! Attack simulations: modules that turn their hook into a call back into
//! the engine, and callers racing on the execution gate.

pub mod concurrency;
pub mod reentrancy;
