//! Records handed to the publication store and the results of a commit.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{DocumentType, Domain};
use crate::draft::{AcademicInfo, PaymentInfo};

/// Identifier assigned by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    /// Awaiting moderation (and payment confirmation for paying submitters).
    Pending,
    Published,
}

/// Fields written when the publication record is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPublication {
    pub title: String,
    pub summary: String,
    pub domain: Domain,
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_info: Option<AcademicInfo>,
    pub pdf_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_photo_url: Option<String>,
    pub author_id: Uuid,
    pub status: PublicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiver_code: Option<String>,
}

/// Terminal result of one commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { record_id: RecordId },
    Failure { reason: String, retryable: bool },
}

impl SubmissionOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        SubmissionOutcome::Failure {
            reason: reason.into(),
            retryable: true,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            SubmissionOutcome::Success { record_id } => Some(record_id),
            SubmissionOutcome::Failure { .. } => None,
        }
    }
}
