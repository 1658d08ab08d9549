//! In-memory profile directory.
//!
//! Stands in for the hub's canonical profile records in tests and
//! single-process deployments.

use crate::ports::ProfileDirectory;
use parking_lot::RwLock;
use shared_types::{Address, ProfileId, PublicationId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Default)]
struct Records {
    owners: HashMap<ProfileId, Address>,
    publications: HashSet<(ProfileId, PublicationId)>,
    /// (blocker, blocked)
    blocks: HashSet<(ProfileId, ProfileId)>,
}

/// Profile directory backed by process memory.
#[derive(Default)]
pub struct InMemoryProfileDirectory {
    records: RwLock<Records>,
}

impl InMemoryProfileDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or re-assign) `profile`, owned by `owner`.
    pub fn create_profile(&self, profile: ProfileId, owner: Address) {
        self.records.write().owners.insert(profile, owner);
        debug!(%profile, %owner, "Profile created");
    }

    /// Create a publication under an existing profile.
    ///
    /// Returns false if the profile does not exist.
    pub fn create_publication(&self, profile: ProfileId, publication: PublicationId) -> bool {
        let mut records = self.records.write();
        if !records.owners.contains_key(&profile) {
            return false;
        }
        records.publications.insert((profile, publication));
        true
    }

    /// Set or lift a block from `blocker` on `blocked`.
    pub fn set_blocked(&self, blocker: ProfileId, blocked: ProfileId, is_blocked: bool) {
        let mut records = self.records.write();
        if is_blocked {
            records.blocks.insert((blocker, blocked));
        } else {
            records.blocks.remove(&(blocker, blocked));
        }
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn owner_of(&self, profile: ProfileId) -> Option<Address> {
        self.records.read().owners.get(&profile).copied()
    }

    fn publication_exists(&self, profile: ProfileId, publication: PublicationId) -> bool {
        self.records.read().publications.contains(&(profile, publication))
    }

    fn is_blocked(&self, blocker: ProfileId, blocked: ProfileId) -> bool {
        self.records.read().blocks.contains(&(blocker, blocked))
    }
}
