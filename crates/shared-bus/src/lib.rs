//! # Shared Bus - Notification Bus for the Social Graph
//!
//! Carries the observable notifications emitted by the registry and the
//! action engine to any number of off-line consumers.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ ActionEngine │                    │   Indexer    │
//! │  / Registry  │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! The engine publishes only after an outermost call commits, so consumers
//! never observe notifications from a rolled-back call.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, GraphEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
