//! Collaborator implementations shipped with the crate.

pub mod memory;

pub use memory::{
    MemoryBackend, MemoryDraftStore, MemoryFileStorage, MemoryIdentityProvider,
    MemoryPublicationRecords, MemoryWaiverAuthority, StoredUpload,
};
