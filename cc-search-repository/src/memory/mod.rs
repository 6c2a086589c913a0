//! In-memory implementations of the repository interfaces.
//!
//! `InMemoryIndex` stands in for the search service (dry runs, tests).
//! `InMemoryNetwork` stands in for the native content runtime and can be
//! loaded from and saved to a JSON snapshot.

mod index;
mod network;

pub use index::{IndexCall, InMemoryIndex};
pub use network::{GroupsSnapshot, InMemoryNetwork, MetadataEntry, NetworkSnapshot};
