//! pubflow-domain
//!
//! Pure domain models for the publication submission workflow (drafts, catalogue
//! enums, identities, waiver verification, outcomes and snapshots).
//! No I/O, no storage, no network. Only data types and core enums.

pub mod catalog;
pub mod draft;
pub mod identity;
pub mod publication;
pub mod snapshot;
pub mod waiver;

pub use catalog::*;
pub use draft::*;
pub use identity::*;
pub use publication::*;
pub use snapshot::*;
pub use waiver::*;
