//! # Undo Journal
//!
//! Every state mutation made inside an engine call appends an entry here.
//! A failing call unwinds the journal back to the checkpoint taken when it
//! started, in reverse order, which also undoes anything a nested
//! (re-entered) call committed on top of it.

use crate::domain::state::SubjectModuleState;
use sg_02_relationship_ledger::LedgerChange;
use shared_types::Subject;

/// One reversible mutation.
#[derive(Debug, Clone)]
pub enum JournalEntry {
    /// A subject record was written. `previous` is None if it was absent.
    SubjectChanged {
        subject: Subject,
        previous: Option<SubjectModuleState>,
    },
    /// A ledger was pushed onto the arena at `index`.
    LedgerCreated { index: usize },
    /// The ledger at `index` was mutated.
    LedgerChanged { index: usize, change: LedgerChange },
}

/// Position to unwind to if the call that took it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Nesting depth of the call (0 = outermost).
    pub depth: u32,
    pub(crate) journal_len: usize,
    pub(crate) pending_len: usize,
}

impl Checkpoint {
    /// True for the outermost call of a re-entrant chain.
    #[must_use]
    pub fn is_outermost(&self) -> bool {
        self.depth == 0
    }
}
