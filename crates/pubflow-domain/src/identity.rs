//! Submitter identity as reported by the authentication collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Author,
    Administrator,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn author(id: Uuid) -> Self {
        Self::new(id, Role::Author)
    }

    pub fn administrator(id: Uuid) -> Self {
        Self::new(id, Role::Administrator)
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Why a submitter does not have to pay the submission fee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Exemption {
    #[default]
    None,
    Administrator,
    /// Carries the exact code string that was verified.
    VerifiedWaiver(String),
}

impl Exemption {
    pub fn is_exempt(&self) -> bool {
        !matches!(self, Exemption::None)
    }

    pub fn waiver_code(&self) -> Option<&str> {
        match self {
            Exemption::VerifiedWaiver(code) => Some(code.as_str()),
            _ => None,
        }
    }
}
