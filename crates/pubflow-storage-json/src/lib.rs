use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use pubflow_core::{storage::DraftStore, CoreError, Step};
use pubflow_domain::{DraftKey, DraftSnapshot, SNAPSHOT_SCHEMA_VERSION};

const SNAPSHOT_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed JSON persistence for draft snapshots, one file per key.
#[derive(Debug, Clone)]
pub struct JsonDraftStore {
    drafts_dir: PathBuf,
}

impl JsonDraftStore {
    pub fn new(drafts_dir: PathBuf) -> Result<Self, CoreError> {
        fs::create_dir_all(&drafts_dir)?;
        Ok(Self { drafts_dir })
    }

    pub fn drafts_dir(&self) -> &Path {
        &self.drafts_dir
    }

    pub fn snapshot_path(&self, key: &DraftKey) -> PathBuf {
        self.drafts_dir
            .join(format!("{}.{}", canonical_name(key.as_str()), SNAPSHOT_EXTENSION))
    }

    /// File details for the snapshot stored under `key`, if any.
    pub fn snapshot_info(&self, key: &DraftKey) -> Result<Option<SnapshotInfo>, CoreError> {
        let path = self.snapshot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        describe(canonical_name(key.as_str()), path).map(Some)
    }

    /// Every stored snapshot file, most recently written first.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>, CoreError> {
        if !self.drafts_dir.exists() {
            return Ok(Vec::new());
        }
        let mut rows = Vec::new();
        for entry in fs::read_dir(&self.drafts_dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                rows.push(describe(stem.to_string(), path.clone())?);
            }
        }
        rows.sort_by_key(|info| Reverse(info.modified_at));
        Ok(rows)
    }
}

impl DraftStore for JsonDraftStore {
    fn save_snapshot(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), CoreError> {
        let path = self.snapshot_path(key);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &serialize_snapshot(snapshot)?)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(key = %key, step = snapshot.step, "draft snapshot written");
        Ok(())
    }

    fn load_snapshot(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, CoreError> {
        let path = self.snapshot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        load_snapshot_from_path(&path).map(Some)
    }

    fn clear_snapshot(&self, key: &DraftKey) -> Result<(), CoreError> {
        let path = self.snapshot_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Reads and checks a snapshot file. Data written by a newer schema, or
/// pointing at a step that does not exist, is rejected rather than guessed at.
pub fn load_snapshot_from_path(path: &Path) -> Result<DraftSnapshot, CoreError> {
    let data = fs::read_to_string(path)?;
    let snapshot: DraftSnapshot = serde_json::from_str(&data)?;
    if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "snapshot schema {} is newer than supported version {}",
            snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION
        )));
    }
    if Step::from_number(snapshot.step).is_none() {
        return Err(CoreError::Storage(format!(
            "snapshot points at unknown step {}",
            snapshot.step
        )));
    }
    Ok(snapshot)
}

#[derive(Debug, Clone)]
pub struct SnapshotInfo {
    pub key: String,
    pub path: PathBuf,
    pub modified_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

fn describe(key: String, path: PathBuf) -> Result<SnapshotInfo, CoreError> {
    let meta = fs::metadata(&path)?;
    Ok(SnapshotInfo {
        key,
        modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        size_bytes: meta.len(),
        path,
    })
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "draft".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

fn serialize_snapshot(snapshot: &DraftSnapshot) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}
