//! Persisted form of an in-progress submission.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::SubmissionDraft;
use crate::identity::Identity;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

const ANONYMOUS_KEY: &str = "anonymous";

/// Namespace a snapshot is stored under: one per signed-in identity, plus a
/// shared bucket for submitters who are not signed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey(String);

impl DraftKey {
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_KEY.to_string())
    }

    pub fn for_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(identity) => Self(identity.id.to_string()),
            None => Self::anonymous(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `{draft, step}` plus the envelope needed to reject foreign or future data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Uuid>,
    pub draft: SubmissionDraft,
    pub step: u8,
    /// Waiver code already spent by a failed commit of this draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_waiver: Option<String>,
}

impl DraftSnapshot {
    pub fn new(owner: Option<Uuid>, draft: SubmissionDraft, step: u8) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            owner,
            draft,
            step,
            consumed_waiver: None,
        }
    }

    pub fn with_consumed_waiver(mut self, code: Option<String>) -> Self {
        self.consumed_waiver = code;
        self
    }

    /// Whether this snapshot may be restored for `identity`.
    pub fn belongs_to(&self, identity: Option<&Identity>) -> bool {
        self.owner == identity.map(|identity| identity.id)
    }
}
