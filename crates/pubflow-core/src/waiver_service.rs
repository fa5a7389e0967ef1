//! Read-only waiver verification.

use crate::backend::WaiverAuthority;
use crate::error::CoreError;

pub struct WaiverService;

impl WaiverService {
    /// Asks the authority whether `code` is currently valid. Never consumes it.
    pub async fn check(authority: &dyn WaiverAuthority, code: &str) -> Result<bool, CoreError> {
        match authority.check_waiver_code(code).await {
            Ok(check) => {
                tracing::info!(valid = check.valid, "waiver code checked");
                Ok(check.valid)
            }
            Err(err) => {
                tracing::warn!(error = %err, "waiver code check failed");
                Err(CoreError::WaiverCheck(err))
            }
        }
    }
}
