//! Engine configuration from environment variables.

use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::Address;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default upper bound on follow/unfollow batch length.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 64;

/// Default upper bound on nested engine calls made by module hooks.
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 1024;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No hub account configured.
    #[error("hub address is not set")]
    UnsetHub,

    /// No governance account configured.
    #[error("governance address is not set")]
    UnsetGovernance,

    /// Batch limit of zero would reject every follow.
    #[error("max batch size must be at least 1")]
    ZeroBatchSize,

    /// Call depth limit of zero would reject every call.
    #[error("max call depth must be at least 1")]
    ZeroCallDepth,

    /// A variable holds an unparsable address.
    #[error("{var}: invalid address {value:?}")]
    InvalidAddress { var: &'static str, value: String },

    /// A variable holds an unparsable number.
    #[error("{var}: invalid number {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Action engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only account allowed to call mutating engine entry points.
    /// Also the deployer of every relationship ledger.
    pub hub: Address,

    /// Initial governance account of the module registry.
    pub governance: Address,

    /// Maximum targets in one follow or unfollow call.
    pub max_batch_size: usize,

    /// Capacity of the notification channel.
    pub event_channel_capacity: usize,

    /// Maximum frames open at once, counting the outermost call. A module
    /// hook re-entering past this fails with `CallDepthExceeded`.
    pub max_call_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hub: Address::ZERO,
            governance: Address::ZERO,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Configuration with the two roles set and defaults elsewhere.
    #[must_use]
    pub fn new(hub: Address, governance: Address) -> Self {
        Self {
            hub,
            governance,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SG_HUB_ADDRESS`: hub account, `0x`-prefixed hex (default: zero)
    /// - `SG_GOVERNANCE_ADDRESS`: governance account (default: zero)
    /// - `SG_MAX_BATCH_SIZE`: batch limit (default: 64)
    /// - `SG_EVENT_CHANNEL_CAPACITY`: bus capacity (default: 1000)
    /// - `SG_MAX_CALL_DEPTH`: nested call limit (default: 1024)
    ///
    /// Absent variables fall back to defaults; present but unparsable ones
    /// are errors. Call [`EngineConfig::validate`] afterwards.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let address = |var: &'static str, default: Address| match lookup(var) {
            None => Ok(default),
            Some(value) => Address::from_hex(value.trim())
                .map_err(|_| ConfigError::InvalidAddress { var, value }),
        };

        Ok(Self {
            hub: address("SG_HUB_ADDRESS", defaults.hub)?,
            governance: address("SG_GOVERNANCE_ADDRESS", defaults.governance)?,
            max_batch_size: parse_number(&lookup, "SG_MAX_BATCH_SIZE", defaults.max_batch_size)?,
            event_channel_capacity: parse_number(
                &lookup,
                "SG_EVENT_CHANNEL_CAPACITY",
                defaults.event_channel_capacity,
            )?,
            max_call_depth: parse_number(&lookup, "SG_MAX_CALL_DEPTH", defaults.max_call_depth)?,
        })
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.is_zero() {
            return Err(ConfigError::UnsetHub);
        }
        if self.governance.is_zero() {
            return Err(ConfigError::UnsetGovernance);
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::ZeroCallDepth);
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
