//! # Engine State
//!
//! The subject table and the ledger arena. Subjects hold an optional index
//! into the arena; once written, a subject's ledger handle is never
//! recomputed or replaced.
//!
//! Every mutator records an undo entry in the journal, so a failed call can
//! be unwound to its checkpoint.

use crate::domain::journal::{Checkpoint, JournalEntry};
use shared_bus::GraphEvent;
use sg_02_relationship_ledger::{FollowOutcome, LedgerChange, RelationshipLedger};
use shared_types::{ActionError, Address, ModuleId, ProfileId, Subject, Timestamp, TokenId};
use std::collections::HashMap;
use tracing::debug;

/// Position of a deployed ledger in the arena, with its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerHandle {
    /// Arena index.
    pub index: usize,
    /// Address the ledger was deployed at.
    pub address: Address,
}

/// Per-subject record: attached module and deployed ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectModuleState {
    /// Attached module, None if unbound.
    pub module: Option<ModuleId>,
    /// Ledger, None until the first action on the subject.
    pub ledger: Option<LedgerHandle>,
}

/// All mutable engine state.
#[derive(Debug, Default)]
pub struct EngineState {
    subjects: HashMap<Subject, SubjectModuleState>,
    ledgers: Vec<RelationshipLedger>,
    journal: Vec<JournalEntry>,
    /// Notifications waiting for the outermost call to commit.
    pending: Vec<GraphEvent>,
    depth: u32,
}

impl EngineState {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Record for `subject` (default if never touched).
    #[must_use]
    pub fn binding(&self, subject: &Subject) -> SubjectModuleState {
        self.subjects.get(subject).copied().unwrap_or_default()
    }

    /// Ledger deployed for `subject`, if any.
    #[must_use]
    pub fn ledger_of(&self, subject: &Subject) -> Option<&RelationshipLedger> {
        let handle = self.subjects.get(subject)?.ledger?;
        self.ledgers.get(handle.index)
    }

    /// All deployed ledgers in deployment order.
    #[must_use]
    pub fn ledgers(&self) -> &[RelationshipLedger] {
        &self.ledgers
    }

    /// All subject records.
    pub fn subjects(&self) -> impl Iterator<Item = (&Subject, &SubjectModuleState)> {
        self.subjects.iter()
    }

    /// Current call nesting depth (0 when idle).
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Undo entries recorded by calls still in flight.
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    // =========================================================================
    // MUTATIONS (journaled)
    // =========================================================================

    fn write_subject(&mut self, subject: Subject, record: SubjectModuleState) {
        let previous = self.subjects.insert(subject, record);
        self.journal
            .push(JournalEntry::SubjectChanged { subject, previous });
    }

    /// Bind (or clear) the module attached to `subject`. The ledger handle
    /// is left untouched.
    pub fn set_module(&mut self, subject: Subject, module: Option<ModuleId>) {
        let record = SubjectModuleState {
            module,
            ..self.binding(&subject)
        };
        self.write_subject(subject, record);
    }

    /// Return the ledger of `subject`, deploying it first if absent.
    ///
    /// Deployment writes the handle and buffers a `LedgerDeployed`
    /// notification before returning, so any later token issuance (and any
    /// module re-entering afterwards) sees the ledger as deployed.
    pub fn ensure_ledger(&mut self, subject: Subject, deployer: Address, now: Timestamp) -> LedgerHandle {
        let record = self.binding(&subject);
        if let Some(handle) = record.ledger {
            return handle;
        }

        let ledger = RelationshipLedger::new(deployer, subject);
        let handle = LedgerHandle {
            index: self.ledgers.len(),
            address: ledger.address(),
        };
        self.ledgers.push(ledger);
        self.journal.push(JournalEntry::LedgerCreated {
            index: handle.index,
        });
        self.write_subject(
            subject,
            SubjectModuleState {
                ledger: Some(handle),
                ..record
            },
        );

        debug!(subject = %subject, ledger = %handle.address, "Ledger deployed");
        self.emit(GraphEvent::LedgerDeployed {
            subject,
            ledger: handle.address,
            timestamp: now,
        });
        handle
    }

    fn ledger_mut(&mut self, handle: LedgerHandle) -> Result<&mut RelationshipLedger, ActionError> {
        // Handles are only produced by `ensure_ledger`, so this cannot miss
        // unless the arena was unwound underneath a stale handle.
        self.ledgers
            .get_mut(handle.index)
            .ok_or(ActionError::ModuleRejected {
                module: handle.address,
                reason: "stale ledger handle".to_string(),
            })
    }

    fn record_ledger_change(&mut self, handle: LedgerHandle, change: LedgerChange) {
        self.journal.push(JournalEntry::LedgerChanged {
            index: handle.index,
            change,
        });
    }

    /// Issue a token on the ledger at `handle` to `recipient`.
    pub fn issue_token(
        &mut self,
        handle: LedgerHandle,
        recipient: Address,
        now: Timestamp,
    ) -> Result<TokenId, ActionError> {
        let (token_id, change) = self.ledger_mut(handle)?.issue(recipient, now);
        self.record_ledger_change(handle, change);
        Ok(token_id)
    }

    /// Delegate a follow to the ledger at `handle`.
    pub fn follow(
        &mut self,
        handle: LedgerHandle,
        follower: ProfileId,
        follower_owner: Address,
        executor: Address,
        token_id: TokenId,
        now: Timestamp,
    ) -> Result<FollowOutcome, ActionError> {
        let outcome = self
            .ledger_mut(handle)?
            .follow(follower, follower_owner, executor, token_id, now)?;
        self.record_ledger_change(handle, outcome.change.clone());
        Ok(outcome)
    }

    /// Delegate an unfollow to the ledger at `handle`.
    pub fn unfollow(&mut self, handle: LedgerHandle, unfollower: ProfileId) -> Result<TokenId, ActionError> {
        let (token_id, change) = self.ledger_mut(handle)?.unfollow(unfollower)?;
        self.record_ledger_change(handle, change);
        Ok(token_id)
    }

    /// Buffer a notification for release when the outermost call commits.
    pub fn emit(&mut self, event: GraphEvent) {
        self.pending.push(event);
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    /// Open a call frame.
    pub fn begin_frame(&mut self) -> Checkpoint {
        let checkpoint = Checkpoint {
            depth: self.depth,
            journal_len: self.journal.len(),
            pending_len: self.pending.len(),
        };
        self.depth += 1;
        checkpoint
    }

    /// Close a successful frame.
    ///
    /// Returns the buffered notifications when the outermost frame closes;
    /// nested frames keep their effects in the journal so an enclosing
    /// failure can still undo them.
    pub fn commit_frame(&mut self, checkpoint: Checkpoint) -> Option<Vec<GraphEvent>> {
        self.depth = checkpoint.depth;
        if !checkpoint.is_outermost() {
            return None;
        }
        self.journal.clear();
        Some(std::mem::take(&mut self.pending))
    }

    /// Close a failed frame, undoing everything recorded since `checkpoint`.
    ///
    /// Returns the number of undo entries applied.
    pub fn revert_frame(&mut self, checkpoint: Checkpoint) -> usize {
        let mut undone = 0;
        while self.journal.len() > checkpoint.journal_len {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            self.undo(entry);
            undone += 1;
        }
        self.pending.truncate(checkpoint.pending_len);
        self.depth = checkpoint.depth;
        undone
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::SubjectChanged { subject, previous } => match previous {
                Some(record) => {
                    self.subjects.insert(subject, record);
                }
                None => {
                    self.subjects.remove(&subject);
                }
            },
            JournalEntry::LedgerCreated { index } => {
                debug_assert_eq!(index + 1, self.ledgers.len(), "ledger creation unwound out of order");
                self.ledgers.truncate(index);
            }
            JournalEntry::LedgerChanged { index, change } => {
                if let Some(ledger) = self.ledgers.get_mut(index) {
                    ledger.revert(change);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
