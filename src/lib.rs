#![doc(test(attr(deny(warnings))))]

//! Submission Core drives the multi-step publication submission workflow:
//! a wizard that collects metadata, gates each page on field validators,
//! autosaves the draft, verifies waiver codes and commits the result through
//! hosted collaborators.

pub mod autosave;
pub mod backend;
pub mod cli;
pub mod errors;
pub mod utils;
pub mod wizard;

pub use errors::SubmissionError;
pub use wizard::{Advance, MountHandle, SubmissionWizard, WizardObserver, WizardSettings};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Submission Core tracing initialized.");
    });
}
