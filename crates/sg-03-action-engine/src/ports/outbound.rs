//! Outbound (Driven) ports for the Action Engine.
//!
//! The engine never owns profiles or publications. It asks the hub's read
//! surface whether they exist, who owns them and who blocked whom.

use shared_types::{Address, ProfileId, PublicationId};

/// Read surface of the orchestrator's canonical profile records.
pub trait ProfileDirectory: Send + Sync {
    /// Account owning `profile`, None if the profile does not exist.
    fn owner_of(&self, profile: ProfileId) -> Option<Address>;

    /// Whether `profile` exists.
    fn profile_exists(&self, profile: ProfileId) -> bool {
        self.owner_of(profile).is_some()
    }

    /// Whether `publication` exists under `profile`.
    fn publication_exists(&self, profile: ProfileId, publication: PublicationId) -> bool;

    /// Whether `blocker` has blocked `blocked`.
    fn is_blocked(&self, blocker: ProfileId, blocked: ProfileId) -> bool;
}
