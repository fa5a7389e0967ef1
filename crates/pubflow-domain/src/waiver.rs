//! Client-side tracking of a waiver code's verification state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaiverStatus {
    #[default]
    Unchecked,
    Checking,
    Valid,
    Invalid,
}

/// Pairs a candidate code with the result of the last explicit verification.
///
/// Editing the code always drops back to [`WaiverStatus::Unchecked`], so a
/// `Valid` status can only ever describe the exact string that was checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaiverVerification {
    code: String,
    status: WaiverStatus,
}

impl WaiverVerification {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status: WaiverStatus::Unchecked,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> WaiverStatus {
        self.status
    }

    pub fn edit(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.status = WaiverStatus::Unchecked;
    }

    /// Marks a verification as in flight. Returns the code being checked, or
    /// `None` when the code is blank and there is nothing to verify.
    pub fn begin_check(&mut self) -> Option<String> {
        let code = self.code.trim();
        if code.is_empty() {
            return None;
        }
        let code = code.to_string();
        self.status = WaiverStatus::Checking;
        Some(code)
    }

    /// Applies the authority's answer if it still describes the current code.
    /// Returns `false` when the code changed while the check was in flight.
    pub fn resolve(&mut self, checked_code: &str, valid: bool) -> bool {
        if self.code.trim() != checked_code || self.status != WaiverStatus::Checking {
            return false;
        }
        self.status = if valid {
            WaiverStatus::Valid
        } else {
            WaiverStatus::Invalid
        };
        true
    }

    /// Drops an in-flight check that failed to reach the authority.
    pub fn abandon_check(&mut self) {
        if self.status == WaiverStatus::Checking {
            self.status = WaiverStatus::Unchecked;
        }
    }

    /// The verified code, if the current string was confirmed valid.
    pub fn verified_code(&self) -> Option<&str> {
        (self.status == WaiverStatus::Valid).then(|| self.code.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_resets_status() {
        let mut verification = WaiverVerification::new("FREE-2024");
        let code = verification.begin_check().unwrap();
        assert!(verification.resolve(&code, true));
        assert_eq!(verification.status(), WaiverStatus::Valid);

        verification.edit("FREE-2025");
        assert_eq!(verification.status(), WaiverStatus::Unchecked);
        assert_eq!(verification.verified_code(), None);
    }

    #[test]
    fn stale_resolution_is_ignored() {
        let mut verification = WaiverVerification::new("AAA");
        let code = verification.begin_check().unwrap();
        verification.edit("BBB");

        assert!(!verification.resolve(&code, true));
        assert_eq!(verification.status(), WaiverStatus::Unchecked);
    }

    #[test]
    fn blank_code_is_not_checked() {
        let mut verification = WaiverVerification::new("   ");
        assert!(verification.begin_check().is_none());
        assert_eq!(verification.status(), WaiverStatus::Unchecked);
    }
}
