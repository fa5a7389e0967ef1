//! In-process collaborators with call journals and failure injection.
//!
//! Used by the test-suite and by the CLI `demo` command. Each one behaves like
//! its hosted counterpart for the operations the workflow consumes and keeps
//! enough history to assert on afterwards.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pubflow_core::{
    BackendError, Collaborators, CoreError, DraftStore, FileStorage, IdentityProvider,
    PublicationRecords, WaiverAuthority, WaiverCheck, WaiverConsumption,
};
use pubflow_domain::{DraftKey, DraftSnapshot, Identity, LocalFile, NewPublication, RecordId};

const DEFAULT_PUBLIC_URL: &str = "https://storage.local/object/public";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

/// One file accepted by [`MemoryFileStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub destination: String,
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    uploads: Mutex<Vec<StoredUpload>>,
    failure: Mutex<Option<String>>,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following upload fail with `message`, or succeed again
    /// when `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        lock(&self.uploads).clone()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload_file(
        &self,
        file: &LocalFile,
        destination: &str,
    ) -> Result<String, BackendError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(BackendError::new(message));
        }
        let url = format!("{}/{}", DEFAULT_PUBLIC_URL, destination);
        lock(&self.uploads).push(StoredUpload {
            destination: destination.to_string(),
            file_name: file.file_name.clone(),
            url: url.clone(),
        });
        Ok(url)
    }
}

/// Single-use codes. A code is valid until consumed.
#[derive(Debug, Default)]
pub struct MemoryWaiverAuthority {
    unused: Mutex<HashSet<String>>,
    checks: Mutex<Vec<String>>,
    consumed: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryWaiverAuthority {
    pub fn with_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authority = Self::default();
        authority.issue(codes);
        authority
    }

    pub fn issue<I, S>(&self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lock(&self.unused).extend(codes.into_iter().map(Into::into));
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    /// Holds every check for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    pub fn checks(&self) -> Vec<String> {
        lock(&self.checks).clone()
    }

    pub fn consumed(&self) -> Vec<String> {
        lock(&self.consumed).clone()
    }

    pub fn is_unused(&self, code: &str) -> bool {
        lock(&self.unused).contains(code)
    }
}

#[async_trait]
impl WaiverAuthority for MemoryWaiverAuthority {
    async fn check_waiver_code(&self, code: &str) -> Result<WaiverCheck, BackendError> {
        let delay = *lock(&self.delay);
        pause(delay).await;
        if let Some(message) = lock(&self.failure).clone() {
            return Err(BackendError::new(message));
        }
        lock(&self.checks).push(code.to_string());
        Ok(WaiverCheck {
            valid: self.is_unused(code),
        })
    }

    async fn consume_waiver_code(&self, code: &str) -> Result<WaiverConsumption, BackendError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(BackendError::new(message));
        }
        let success = lock(&self.unused).remove(code);
        if success {
            lock(&self.consumed).push(code.to_string());
        }
        Ok(WaiverConsumption { success })
    }
}

#[derive(Debug, Default)]
pub struct MemoryPublicationRecords {
    created: Mutex<Vec<(RecordId, NewPublication)>>,
    attempts: Mutex<usize>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
}

impl MemoryPublicationRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    /// Holds every create call for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    pub fn created(&self) -> Vec<(RecordId, NewPublication)> {
        lock(&self.created).clone()
    }

    /// Number of create calls, failed ones included.
    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }
}

#[async_trait]
impl PublicationRecords for MemoryPublicationRecords {
    async fn create_publication_record(
        &self,
        fields: &NewPublication,
    ) -> Result<RecordId, BackendError> {
        *lock(&self.attempts) += 1;
        let delay = *lock(&self.delay);
        pause(delay).await;
        if let Some(message) = lock(&self.failure).clone() {
            return Err(BackendError::new(message));
        }
        let mut created = lock(&self.created);
        let id = RecordId::new(format!("pub-{:04}", created.len() + 1));
        created.push((id.clone(), fields.clone()));
        Ok(id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    current: Mutex<Option<Identity>>,
}

impl MemoryIdentityProvider {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: Mutex::new(Some(identity)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set(&self, identity: Option<Identity>) {
        *lock(&self.current) = identity;
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn current_identity(&self) -> Option<Identity> {
        lock(&self.current).clone()
    }
}

/// Draft snapshots kept as serialized JSON, one entry per key, so stored
/// content can be compared byte for byte.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: Mutex<BTreeMap<String, String>>,
    writes: Mutex<usize>,
    failure: Mutex<Option<String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failure(&self, message: Option<&str>) {
        *lock(&self.failure) = message.map(str::to_string);
    }

    /// Stores arbitrary text under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &DraftKey, raw: impl Into<String>) {
        lock(&self.entries).insert(key.as_str().to_string(), raw.into());
    }

    pub fn raw(&self, key: &DraftKey) -> Option<String> {
        lock(&self.entries).get(key.as_str()).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Successful `save_snapshot` calls so far.
    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }

    fn check_failure(&self) -> Result<(), CoreError> {
        match lock(&self.failure).clone() {
            Some(message) => Err(CoreError::Storage(message)),
            None => Ok(()),
        }
    }
}

impl DraftStore for MemoryDraftStore {
    fn save_snapshot(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), CoreError> {
        self.check_failure()?;
        let json = serde_json::to_string_pretty(snapshot)?;
        lock(&self.entries).insert(key.as_str().to_string(), json);
        *lock(&self.writes) += 1;
        Ok(())
    }

    fn load_snapshot(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, CoreError> {
        self.check_failure()?;
        match self.raw(key) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn clear_snapshot(&self, key: &DraftKey) -> Result<(), CoreError> {
        self.check_failure()?;
        lock(&self.entries).remove(key.as_str());
        Ok(())
    }
}

/// The four hosted collaborators, kept as concrete handles so callers can
/// script and inspect them.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    pub files: Arc<MemoryFileStorage>,
    pub waivers: Arc<MemoryWaiverAuthority>,
    pub records: Arc<MemoryPublicationRecords>,
    pub identity: Arc<MemoryIdentityProvider>,
}

impl MemoryBackend {
    pub fn new(identity: Option<Identity>) -> Self {
        let provider = MemoryIdentityProvider::default();
        provider.set(identity);
        Self {
            files: Arc::new(MemoryFileStorage::new()),
            waivers: Arc::new(MemoryWaiverAuthority::default()),
            records: Arc::new(MemoryPublicationRecords::new()),
            identity: Arc::new(provider),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.files.clone(),
            self.waivers.clone(),
            self.records.clone(),
            self.identity.clone(),
        )
    }
}
