use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use pubflow_core::{
    UploadFolders, ValidationPolicy, DEFAULT_COUNTRY_CODE, DEFAULT_DOCUMENT_FOLDER,
    DEFAULT_PHOTO_FOLDER, MAX_PDF_BYTES, MAX_PHOTO_BYTES, MINIMUM_AMOUNT,
};

use crate::ConfigError;

/// Workflow settings persisted alongside local drafts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_autosave_interval_secs")]
    pub autosave_interval_secs: u64,
    #[serde(default = "Config::default_max_pdf_bytes")]
    pub max_pdf_bytes: u64,
    #[serde(default = "Config::default_max_photo_bytes")]
    pub max_photo_bytes: u64,
    #[serde(default = "Config::default_minimum_amount")]
    pub minimum_amount: f64,
    #[serde(default = "Config::default_phone_country_code")]
    pub phone_country_code: String,
    #[serde(default = "Config::default_document_folder")]
    pub document_folder: String,
    #[serde(default = "Config::default_photo_folder")]
    pub photo_folder: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for draft snapshots. Defaults to `<data dir>/drafts`.
    pub drafts_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_interval_secs: Self::default_autosave_interval_secs(),
            max_pdf_bytes: Self::default_max_pdf_bytes(),
            max_photo_bytes: Self::default_max_photo_bytes(),
            minimum_amount: Self::default_minimum_amount(),
            phone_country_code: Self::default_phone_country_code(),
            document_folder: Self::default_document_folder(),
            photo_folder: Self::default_photo_folder(),
            drafts_dir: None,
        }
    }
}

impl Config {
    pub fn default_autosave_interval_secs() -> u64 {
        5
    }

    pub fn default_max_pdf_bytes() -> u64 {
        MAX_PDF_BYTES
    }

    pub fn default_max_photo_bytes() -> u64 {
        MAX_PHOTO_BYTES
    }

    pub fn default_minimum_amount() -> f64 {
        MINIMUM_AMOUNT
    }

    pub fn default_phone_country_code() -> String {
        DEFAULT_COUNTRY_CODE.into()
    }

    pub fn default_document_folder() -> String {
        DEFAULT_DOCUMENT_FOLDER.into()
    }

    pub fn default_photo_folder() -> String {
        DEFAULT_PHOTO_FOLDER.into()
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn resolve_drafts_dir(&self, base: &std::path::Path) -> PathBuf {
        match &self.drafts_dir {
            Some(path) => path.clone(),
            None => base.join("drafts"),
        }
    }

    pub fn upload_folders(&self) -> UploadFolders {
        UploadFolders {
            documents: self.document_folder.clone(),
            photos: self.photo_folder.clone(),
        }
    }

    pub fn validation_policy(&self) -> Result<ValidationPolicy, ConfigError> {
        ValidationPolicy::new(
            self.max_pdf_bytes,
            self.max_photo_bytes,
            self.minimum_amount,
            self.phone_country_code.clone(),
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Rejects settings the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "autosave_interval_secs must be at least 1".into(),
            ));
        }
        if self.document_folder.trim_matches('/').trim().is_empty()
            || self.photo_folder.trim_matches('/').trim().is_empty()
        {
            return Err(ConfigError::Invalid("upload folders cannot be empty".into()));
        }
        self.validation_policy().map(|_| ())
    }
}
