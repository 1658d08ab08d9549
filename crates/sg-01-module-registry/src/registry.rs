//! # Module Registry - Whitelist and Catalog
//!
//! Maps module ids to their implementation and whitelist membership.
//! Lives for the whole runtime: created empty, never torn down.

use parking_lot::RwLock;
use shared_bus::{EventPublisher, GraphEvent};
use shared_types::{ActionError, Address, DynModule, ModuleId, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Registration and whitelist state of a module id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleStatus {
    /// An implementation is registered under the id.
    pub registered: bool,
    /// Governance currently allows attaching it.
    pub whitelisted: bool,
}

/// Entry for a module id.
#[derive(Default)]
struct ModuleEntry {
    /// The module instance, once registered.
    module: Option<DynModule>,
    /// Whitelist membership.
    whitelisted: bool,
}

/// Central registry for all modules.
pub struct ModuleRegistry {
    /// Account holding the governance capability.
    governance: RwLock<Address>,
    /// Entries by module id.
    entries: RwLock<HashMap<ModuleId, ModuleEntry>>,
    /// Notification sink.
    publisher: Arc<dyn EventPublisher>,
    /// Timestamp source for notifications.
    time: Arc<dyn TimeSource>,
}

impl ModuleRegistry {
    /// Create an empty registry governed by `governance`.
    pub fn new(
        governance: Address,
        publisher: Arc<dyn EventPublisher>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            governance: RwLock::new(governance),
            entries: RwLock::new(HashMap::new()),
            publisher,
            time,
        }
    }

    /// Current governance account.
    pub fn governance(&self) -> Address {
        *self.governance.read()
    }

    fn require_governance(&self, caller: Address) -> Result<(), ActionError> {
        if caller != self.governance() {
            warn!(caller = %caller, "Rejected non-governance registry call");
            return Err(ActionError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Hand the governance role to `new_governance`.
    #[instrument(skip(self))]
    pub fn set_governance(&self, caller: Address, new_governance: Address) -> Result<(), ActionError> {
        self.require_governance(caller)?;

        let previous = std::mem::replace(&mut *self.governance.write(), new_governance);
        info!(previous = %previous, current = %new_governance, "Governance changed");

        self.publisher.publish(GraphEvent::GovernanceChanged {
            previous,
            current: new_governance,
            timestamp: self.time.now(),
        });
        Ok(())
    }

    /// Toggle whitelist membership of `module`.
    ///
    /// Idempotent: setting the current value again succeeds and still
    /// notifies. The id does not have to be registered yet.
    #[instrument(skip(self))]
    pub fn set_whitelisted(
        &self,
        caller: Address,
        module: ModuleId,
        whitelisted: bool,
    ) -> Result<(), ActionError> {
        self.require_governance(caller)?;

        self.entries.write().entry(module).or_default().whitelisted = whitelisted;
        info!(module = %module, whitelisted, "Module whitelist changed");

        self.publisher.publish(GraphEvent::ModuleWhitelisted {
            module,
            whitelisted,
            governance: caller,
            timestamp: self.time.now(),
        });
        Ok(())
    }

    /// Pure whitelist lookup.
    pub fn is_whitelisted(&self, module: ModuleId) -> bool {
        self.entries
            .read()
            .get(&module)
            .is_some_and(|entry| entry.whitelisted)
    }

    /// Make an implementation resolvable under `module_id`.
    ///
    /// Registration does not whitelist. An id can be registered only once.
    #[instrument(skip(self, module), fields(name = module.name()))]
    pub fn register(&self, module_id: ModuleId, module: DynModule) -> Result<(), ActionError> {
        let name = module.name().to_string();
        {
            let mut entries = self.entries.write();
            let entry = entries.entry(module_id).or_default();
            if entry.module.is_some() {
                warn!(module = %module_id, "Module id already registered");
                return Err(ActionError::ModuleAlreadyRegistered(module_id));
            }
            entry.module = Some(module);
        }
        info!(module = %module_id, name = %name, "Module registered");

        self.publisher.publish(GraphEvent::ModuleRegistered {
            module: module_id,
            name,
            timestamp: self.time.now(),
        });
        Ok(())
    }

    /// Resolve the implementation registered under `module_id`.
    ///
    /// Whitelist state is deliberately not consulted here.
    pub fn resolve(&self, module_id: ModuleId) -> Option<DynModule> {
        self.entries
            .read()
            .get(&module_id)
            .and_then(|entry| entry.module.clone())
    }

    /// Registration and whitelist state of `module_id`.
    pub fn status(&self, module_id: ModuleId) -> ModuleStatus {
        self.entries.read().get(&module_id).map_or(
            ModuleStatus {
                registered: false,
                whitelisted: false,
            },
            |entry| ModuleStatus {
                registered: entry.module.is_some(),
                whitelisted: entry.whitelisted,
            },
        )
    }

    /// All currently whitelisted ids, sorted.
    pub fn whitelisted_modules(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.whitelisted)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

// =============================================================================
// TESTS
// =============================================================================
