//! Adapters for the Action Engine's outbound ports.

pub mod profile_directory;

pub use profile_directory::InMemoryProfileDirectory;
