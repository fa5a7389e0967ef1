use pubflow_domain::{DraftKey, DraftSnapshot};

use crate::CoreError;

/// Abstraction over the durable local store holding one draft snapshot per
/// namespace key.
///
/// `load_snapshot` returns `Ok(None)` when nothing is stored and an error when
/// stored data cannot be read back as a snapshot; callers restoring a wizard
/// treat both the same way.
pub trait DraftStore: Send + Sync {
    fn save_snapshot(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), CoreError>;
    fn load_snapshot(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, CoreError>;
    fn clear_snapshot(&self, key: &DraftKey) -> Result<(), CoreError>;
}
