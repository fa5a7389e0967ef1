//! pubflow-core
//!
//! Submission workflow logic: step state machine, field validators, waiver
//! verification and the commit orchestrator, plus the collaborator seams they
//! talk through. Depends on pubflow-domain. No terminal I/O, no concrete
//! storage or network clients.

pub mod backend;
pub mod commit;
pub mod error;
pub mod failure;
pub mod steps;
pub mod storage;
pub mod validation;
pub mod waiver_service;

pub use backend::*;
pub use commit::*;
pub use error::{BackendError, CoreError};
pub use failure::describe_failure;
pub use steps::*;
pub use storage::DraftStore;
pub use validation::*;
pub use waiver_service::*;
