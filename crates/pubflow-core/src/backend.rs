//! Contracts for the hosted services the submission workflow consumes.
//!
//! The concrete protocol belongs to the backend-as-a-service provider; these
//! traits only describe the operations and their results.

use std::sync::Arc;

use async_trait::async_trait;

use pubflow_domain::{Identity, LocalFile, NewPublication, RecordId};

use crate::error::BackendError;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Uploads `file` under `destination` and returns its public URL.
    async fn upload_file(&self, file: &LocalFile, destination: &str)
        -> Result<String, BackendError>;
}

/// Answer to a read-only waiver check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiverCheck {
    pub valid: bool,
}

/// Answer to a consume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiverConsumption {
    pub success: bool,
}

#[async_trait]
pub trait WaiverAuthority: Send + Sync {
    /// Whether `code` exists and is unused. Must not mark the code used.
    async fn check_waiver_code(&self, code: &str) -> Result<WaiverCheck, BackendError>;

    /// Invalidates `code` so it cannot be spent again.
    async fn consume_waiver_code(&self, code: &str) -> Result<WaiverConsumption, BackendError>;
}

#[async_trait]
pub trait PublicationRecords: Send + Sync {
    async fn create_publication_record(
        &self,
        fields: &NewPublication,
    ) -> Result<RecordId, BackendError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Option<Identity>;
}

/// Bundle of collaborator handles shared by the wizard and the orchestrator.
#[derive(Clone)]
pub struct Collaborators {
    pub files: Arc<dyn FileStorage>,
    pub waivers: Arc<dyn WaiverAuthority>,
    pub records: Arc<dyn PublicationRecords>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Collaborators {
    pub fn new(
        files: Arc<dyn FileStorage>,
        waivers: Arc<dyn WaiverAuthority>,
        records: Arc<dyn PublicationRecords>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            files,
            waivers,
            records,
            identity,
        }
    }
}
