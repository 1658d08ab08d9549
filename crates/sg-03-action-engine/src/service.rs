//! # Action Engine Service
//!
//! Runs the two-phase protocol (initialize, then process) for every subject
//! and owns the decision of when a subject's relationship ledger is created.
//!
//! ## Execution Model
//!
//! One execution gate serializes all calls. Module hooks are untrusted and may
//! re-enter the engine on the same thread before returning, so:
//!
//! - the state borrow is released before any hook runs,
//! - everything a hook could observe (binding, ledger, issued token) is
//!   written to the state before the hook is called,
//! - each call is a frame over an undo journal: a failure unwinds to the
//!   frame's checkpoint, success of the outermost frame releases the
//!   buffered notifications.

use crate::adapters::InMemoryProfileDirectory;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{check_all_invariants, EngineState, InvariantCheckResult, SubjectModuleState};
use crate::ports::inbound::{
    ActionEngineApi, FollowGraph, FollowRequest, ProcessOutcome, ProcessRequest, UnfollowRequest,
};
use crate::ports::outbound::ProfileDirectory;
use crate::validation;
use parking_lot::{Mutex, ReentrantMutex};
use sg_01_module_registry::ModuleRegistry;
use sg_02_relationship_ledger::{derive_ledger_address, LedgerKind};
use shared_bus::{EventPublisher, GraphEvent, InMemoryEventBus};
use shared_types::{
    ActionError, Address, Bytes, DynModule, InitializeContext, ManualTimeSource, ModuleId,
    ModuleSelector, ProcessContext, ProfileId, Subject, TimeSource, TokenId,
};
use std::cell::RefCell;
use std::sync::Arc;
use tracing::{debug, debug_span, info, info_span, instrument, warn};
use uuid::Uuid;

/// Statistics for the Action Engine.
///
/// Activity counters only move when the outermost call commits, so work
/// undone by a rollback is never counted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Follow edges created.
    pub follows: u64,
    /// Follow edges removed (including displacements).
    pub unfollows: u64,
    /// Successful process-phase calls.
    pub actions_processed: u64,
    /// Ledgers deployed.
    pub ledgers_deployed: u64,
    /// Successful initialize calls.
    pub modules_initialized: u64,
    /// Calls refused before opening a frame (hub gate, depth limit).
    pub rejected_calls: u64,
    /// Calls (outer or nested) that failed and were unwound.
    pub rolled_back_calls: u64,
}

impl EngineStats {
    fn record(&mut self, event: &GraphEvent) {
        match event {
            GraphEvent::Followed { .. } => self.follows += 1,
            GraphEvent::Unfollowed { .. } => self.unfollows += 1,
            GraphEvent::ActionProcessed { .. } => self.actions_processed += 1,
            GraphEvent::LedgerDeployed { .. } => self.ledgers_deployed += 1,
            GraphEvent::ActionInitialized { .. } => self.modules_initialized += 1,
            GraphEvent::ModuleWhitelisted { .. }
            | GraphEvent::GovernanceChanged { .. }
            | GraphEvent::ModuleRegistered { .. } => {}
        }
    }
}

/// The Action Engine.
pub struct ActionEngine {
    /// Engine configuration.
    pub(crate) config: EngineConfig,
    /// Whitelist and module catalog.
    pub(crate) registry: Arc<ModuleRegistry>,
    /// Hub read surface.
    pub(crate) directory: Arc<dyn ProfileDirectory>,
    /// Notification sink.
    publisher: Arc<dyn EventPublisher>,
    /// Timestamp source.
    pub(crate) time: Arc<dyn TimeSource>,
    /// Execution gate. Re-entrant so a module hook can call back in.
    gate: ReentrantMutex<RefCell<EngineState>>,
    /// Engine statistics.
    stats: Mutex<EngineStats>,
}

impl ActionEngine {
    /// Create an engine with empty state.
    ///
    /// Fails if `config` does not name a hub and a governance account, so
    /// the null account can never pass the hub gate.
    pub fn new(
        config: EngineConfig,
        registry: Arc<ModuleRegistry>,
        directory: Arc<dyn ProfileDirectory>,
        publisher: Arc<dyn EventPublisher>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            hub = %config.hub,
            max_batch_size = config.max_batch_size,
            max_call_depth = config.max_call_depth,
            "Action engine created"
        );
        Ok(Self {
            config,
            registry,
            directory,
            publisher,
            time,
            gate: ReentrantMutex::new(RefCell::new(EngineState::new())),
            stats: Mutex::new(EngineStats::default()),
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // FRAME MACHINERY
    // =========================================================================

    pub(crate) fn require_hub(&self, caller: Address) -> Result<(), ActionError> {
        if caller != self.config.hub {
            self.stats.lock().rejected_calls += 1;
            warn!(caller = %caller, "Rejected non-hub engine call");
            return Err(ActionError::NotHub { caller });
        }
        Ok(())
    }

    /// Run `body` as one all-or-nothing call.
    pub(crate) fn run_frame<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&RefCell<EngineState>) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let gate = self.gate.lock();
        let depth = gate.borrow().depth();
        if depth >= self.config.max_call_depth {
            self.stats.lock().rejected_calls += 1;
            warn!(operation, depth, "Rejected call past the depth limit");
            return Err(ActionError::CallDepthExceeded { depth });
        }
        let checkpoint = gate.borrow_mut().begin_frame();

        let span = if checkpoint.is_outermost() {
            info_span!("engine_call", operation, operation_id = %Uuid::new_v4())
        } else {
            debug_span!("reentrant_call", operation, depth = checkpoint.depth)
        };
        let _entered = span.enter();

        match body(&*gate) {
            Ok(value) => {
                let released = gate.borrow_mut().commit_frame(checkpoint);
                match released {
                    Some(events) => self.release(events),
                    None => debug!(depth = checkpoint.depth, "Nested call committed"),
                }
                Ok(value)
            }
            Err(error) => {
                let undone = gate.borrow_mut().revert_frame(checkpoint);
                self.stats.lock().rolled_back_calls += 1;
                warn!(error = %error, undone, depth = checkpoint.depth, "Call rolled back");
                Err(error)
            }
        }
    }

    fn release(&self, events: Vec<GraphEvent>) {
        {
            let mut stats = self.stats.lock();
            for event in &events {
                stats.record(event);
            }
        }
        let released = self.publisher.publish_committed(events);
        debug!(released, "Notifications released");
    }

    fn read<T>(&self, f: impl FnOnce(&EngineState) -> T) -> T {
        let gate = self.gate.lock();
        let state = gate.borrow();
        f(&state)
    }

    pub(crate) fn resolve(&self, module: ModuleId) -> Result<DynModule, ActionError> {
        self.registry
            .resolve(module)
            .ok_or(ActionError::UnknownModule(module))
    }

    // =========================================================================
    // INITIALIZE PHASE
    // =========================================================================

    /// Attach the module named by `selector` to `subject`, replacing any
    /// previous binding, and return its initialization result verbatim.
    ///
    /// A null selector clears the binding and returns empty bytes. No ledger
    /// is created here.
    #[instrument(skip(self, selector), fields(module = ?selector.target(), payload_len = selector.payload.len()))]
    pub fn initialize(
        &self,
        caller: Address,
        subject: Subject,
        transaction_executor: Address,
        selector: ModuleSelector,
    ) -> Result<Bytes, ActionError> {
        self.require_hub(caller)?;
        self.run_frame("initialize", |cell| {
            validation::validate_subject_exists(&*self.directory, &subject)?;

            let module = match selector.target() {
                Some(id) => {
                    if !self.registry.is_whitelisted(id) {
                        return Err(ActionError::ModuleNotWhitelisted(id));
                    }
                    Some((id, self.resolve(id)?))
                }
                None => None,
            };
            let module_id = module.as_ref().map(|(id, _)| *id);

            cell.borrow_mut().set_module(subject, module_id);

            let init_result = match &module {
                Some((_, implementation)) => implementation.initialize(&InitializeContext {
                    subject,
                    transaction_executor,
                    payload: selector.payload.clone(),
                })?,
                None => Bytes::new(),
            };

            cell.borrow_mut().emit(GraphEvent::ActionInitialized {
                subject,
                module: module_id,
                executor: transaction_executor,
                init_result: init_result.clone(),
                timestamp: self.time.now(),
            });
            info!(subject = %subject, module = ?module_id, "Module attached");
            Ok(init_result)
        })
    }

    /// Like [`ActionEngine::initialize`], decoding the selector from its
    /// wire form first.
    pub fn initialize_encoded(
        &self,
        caller: Address,
        subject: Subject,
        transaction_executor: Address,
        selector: &[u8],
    ) -> Result<Bytes, ActionError> {
        self.require_hub(caller)?;
        let selector = ModuleSelector::decode(selector)?;
        self.initialize(caller, subject, transaction_executor, selector)
    }

    // =========================================================================
    // PROCESS PHASE
    // =========================================================================

    /// Run an action on `request.subject`: deploy its ledger if needed, issue
    /// a token to the recipient, then hand over to the bound module.
    #[instrument(skip(self, request), fields(subject = %request.subject, actor = %request.actor_profile_id))]
    pub fn process(&self, caller: Address, request: ProcessRequest) -> Result<ProcessOutcome, ActionError> {
        self.require_hub(caller)?;
        self.run_frame("process", |cell| {
            let subject = request.subject;
            let module_id = cell
                .borrow()
                .binding(&subject)
                .module
                .ok_or(ActionError::ActionNotInitialized(subject))?;

            validation::validate_subject_exists(&*self.directory, &subject)?;
            validation::validate_profile_exists(&*self.directory, request.actor_profile_id)?;
            validation::validate_not_blocked(
                &*self.directory,
                subject.owner_profile(),
                request.actor_profile_id,
            )?;
            validation::validate_referrers(&*self.directory, &subject, &request.referrers)?;
            let module = self.resolve(module_id)?;

            let now = self.time.now();
            let recipient = request.recipient();
            let token_id = {
                let mut state = cell.borrow_mut();
                let handle = state.ensure_ledger(subject, self.config.hub, now);
                state.issue_token(handle, recipient, now)?
            };

            let module_result = module.process(&ProcessContext {
                subject,
                actor_profile_id: request.actor_profile_id,
                token_id,
                transaction_executor: request.transaction_executor,
                referrers: request.referrers.clone(),
                payload: request.payload.clone(),
            })?;

            cell.borrow_mut().emit(GraphEvent::ActionProcessed {
                subject,
                actor: request.actor_profile_id,
                recipient,
                token_id,
                module_input: request.payload.clone(),
                module_result: module_result.clone(),
                executor: request.transaction_executor,
                referrers: request.referrers.clone(),
                timestamp: now,
            });
            info!(subject = %subject, token = %token_id, recipient = %recipient, "Action processed");

            Ok(ProcessOutcome {
                token_id,
                module_result,
            })
        })
    }

    // =========================================================================
    // READ SURFACE
    // =========================================================================

    /// Module and ledger bound to `subject`.
    pub fn module_binding(&self, subject: &Subject) -> SubjectModuleState {
        self.read(|state| state.binding(subject))
    }

    /// Address of the ledger deployed for `subject`, if any.
    pub fn ledger_of(&self, subject: &Subject) -> Option<Address> {
        self.module_binding(subject).ledger.map(|handle| handle.address)
    }

    /// Address `subject`'s ledger has, or will have once deployed.
    pub fn predict_ledger_address(&self, subject: &Subject) -> Address {
        derive_ledger_address(self.config.hub, LedgerKind::for_subject(subject), subject)
    }

    /// Token bound to the `follower` → `followed` edge.
    pub fn follow_token_id(&self, follower: ProfileId, followed: ProfileId) -> Option<TokenId> {
        self.read(|state| {
            state
                .ledger_of(&Subject::Profile(followed))?
                .follower_token(follower)
        })
    }

    /// Number of live follow edges into `profile`.
    pub fn follower_count(&self, profile: ProfileId) -> usize {
        self.read(|state| {
            state
                .ledger_of(&Subject::Profile(profile))
                .map_or(0, |ledger| ledger.follower_count())
        })
    }

    /// Holder of `token_id` on `subject`'s ledger.
    pub fn token_holder(&self, subject: &Subject, token_id: TokenId) -> Option<Address> {
        self.read(|state| state.ledger_of(subject)?.holder_of(token_id))
    }

    /// Tokens ever issued on `subject`'s ledger.
    pub fn tokens_issued(&self, subject: &Subject) -> u64 {
        self.read(|state| state.ledger_of(subject).map_or(0, |ledger| ledger.tokens_issued()))
    }

    /// Counters since start-up.
    pub fn stats(&self) -> EngineStats {
        *self.stats.lock()
    }

    /// Check structural invariants of the current state.
    pub fn check_invariants(&self) -> InvariantCheckResult {
        self.read(check_all_invariants)
    }
}

impl FollowGraph for ActionEngine {
    fn is_following(&self, follower: ProfileId, followed: ProfileId) -> bool {
        self.follow_token_id(follower, followed).is_some()
    }
}

// =============================================================================
// ActionEngineApi Implementation
// =============================================================================

impl ActionEngineApi for ActionEngine {
    fn initialize(
        &self,
        caller: Address,
        subject: Subject,
        transaction_executor: Address,
        selector: ModuleSelector,
    ) -> Result<Bytes, ActionError> {
        Self::initialize(self, caller, subject, transaction_executor, selector)
    }

    fn process(&self, caller: Address, request: ProcessRequest) -> Result<ProcessOutcome, ActionError> {
        Self::process(self, caller, request)
    }

    fn follow(&self, caller: Address, request: FollowRequest) -> Result<Vec<TokenId>, ActionError> {
        Self::follow(self, caller, request)
    }

    fn unfollow(&self, caller: Address, request: UnfollowRequest) -> Result<Vec<TokenId>, ActionError> {
        Self::unfollow(self, caller, request)
    }

    fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    fn stats(&self) -> EngineStats {
        Self::stats(self)
    }
}

// =============================================================================
// IN-MEMORY WIRING
// =============================================================================

/// An engine wired to in-memory adapters, with handles to each of them.
pub struct InMemoryGraph {
    /// The engine.
    pub engine: Arc<ActionEngine>,
    /// Registry shared with the engine.
    pub registry: Arc<ModuleRegistry>,
    /// Profile records the engine reads.
    pub directory: Arc<InMemoryProfileDirectory>,
    /// Bus receiving every notification.
    pub bus: Arc<InMemoryEventBus>,
    /// Clock driving timestamps.
    pub clock: Arc<ManualTimeSource>,
}

/// Create an engine with in-memory adapters (for testing).
pub fn create_in_memory_graph(config: EngineConfig) -> Result<InMemoryGraph, ConfigError> {
    let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
    let clock = Arc::new(ManualTimeSource::new(1_000));
    let directory = Arc::new(InMemoryProfileDirectory::new());
    let registry = Arc::new(ModuleRegistry::new(
        config.governance,
        bus.clone(),
        clock.clone(),
    ));
    let engine = Arc::new(ActionEngine::new(
        config,
        registry.clone(),
        directory.clone(),
        bus.clone(),
        clock.clone(),
    )?);

    Ok(InMemoryGraph {
        engine,
        registry,
        directory,
        bus,
        clock,
    })
}

// =============================================================================
// TESTS
// =============================================================================
