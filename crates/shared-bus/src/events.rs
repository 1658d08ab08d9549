//! # Graph Events
//!
//! Notifications that flow through the shared bus. Each one carries enough
//! identifiers and a timestamp to rebuild relationship history off-line.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, Bytes, ModuleId, ProfileId, Subject, Timestamp, TokenId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEvent {
    // =========================================================================
    // MODULE REGISTRY
    // =========================================================================
    /// Governance toggled a module's whitelist membership.
    ModuleWhitelisted {
        /// The module.
        module: ModuleId,
        /// New membership.
        whitelisted: bool,
        /// Governance account that made the change.
        governance: Address,
        /// When.
        timestamp: Timestamp,
    },

    /// The governance role moved to a new account.
    GovernanceChanged {
        /// Outgoing governance.
        previous: Address,
        /// Incoming governance.
        current: Address,
        /// When.
        timestamp: Timestamp,
    },

    /// A module implementation became resolvable.
    ModuleRegistered {
        /// The module.
        module: ModuleId,
        /// Implementation name.
        name: String,
        /// When.
        timestamp: Timestamp,
    },

    // =========================================================================
    // LEDGERS
    // =========================================================================
    /// A relationship ledger was created and bound to a subject.
    LedgerDeployed {
        /// The subject.
        subject: Subject,
        /// Address of the new ledger.
        ledger: Address,
        /// When.
        timestamp: Timestamp,
    },

    // =========================================================================
    // ACTIONS
    // =========================================================================
    /// A subject's module binding was set (or cleared).
    ActionInitialized {
        /// The subject.
        subject: Subject,
        /// Module now bound, None if cleared.
        module: Option<ModuleId>,
        /// Executor of the transaction.
        executor: Address,
        /// Bytes returned by the module's initialization hook.
        init_result: Bytes,
        /// When.
        timestamp: Timestamp,
    },

    /// An action was processed and a token was issued.
    ActionProcessed {
        /// The subject.
        subject: Subject,
        /// Acting profile.
        actor: ProfileId,
        /// Account that received the token.
        recipient: Address,
        /// Issued token.
        token_id: TokenId,
        /// Data handed to the module.
        module_input: Bytes,
        /// Data returned by the module.
        module_result: Bytes,
        /// Executor of the transaction.
        executor: Address,
        /// Referrers credited.
        referrers: Vec<Subject>,
        /// When.
        timestamp: Timestamp,
    },

    // =========================================================================
    // FOLLOW GRAPH
    // =========================================================================
    /// A follow edge was created.
    Followed {
        /// Following profile.
        follower: ProfileId,
        /// Followed profile.
        followed: ProfileId,
        /// Token now bound to the edge.
        token_id: TokenId,
        /// True if the token was freshly minted, false if re-used.
        minted: bool,
        /// Data handed to the follow module.
        module_input: Bytes,
        /// Data returned by the follow module (empty without one).
        module_result: Bytes,
        /// Executor of the transaction.
        executor: Address,
        /// When.
        timestamp: Timestamp,
    },

    /// A follow edge was removed.
    Unfollowed {
        /// Profile whose edge was removed.
        unfollower: ProfileId,
        /// Previously followed profile.
        unfollowed: ProfileId,
        /// Token that was bound to the edge.
        token_id: TokenId,
        /// Executor of the transaction.
        executor: Address,
        /// When.
        timestamp: Timestamp,
    },
}

impl GraphEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ModuleWhitelisted { .. }
            | Self::GovernanceChanged { .. }
            | Self::ModuleRegistered { .. } => EventTopic::Registry,
            Self::LedgerDeployed { .. } => EventTopic::Ledger,
            Self::ActionInitialized { .. } | Self::ActionProcessed { .. } => EventTopic::Action,
            Self::Followed { .. } | Self::Unfollowed { .. } => EventTopic::Follow,
        }
    }

    /// Timestamp carried by the event.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::ModuleWhitelisted { timestamp, .. }
            | Self::GovernanceChanged { timestamp, .. }
            | Self::ModuleRegistered { timestamp, .. }
            | Self::LedgerDeployed { timestamp, .. }
            | Self::ActionInitialized { timestamp, .. }
            | Self::ActionProcessed { timestamp, .. }
            | Self::Followed { timestamp, .. }
            | Self::Unfollowed { timestamp, .. } => *timestamp,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Whitelist, governance and catalog changes.
    Registry,
    /// Ledger deployments.
    Ledger,
    /// Module initialization and action processing.
    Action,
    /// Follow and unfollow.
    Follow,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &GraphEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
