//! Mutable form state collected by the submission wizard.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::{Currency, DocumentType, Domain, MobileOperator};

/// A file the submitter picked on their own machine, not yet uploaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl LocalFile {
    pub fn new(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

/// Where the publication's document comes from. Holding an enum keeps a local
/// file and a URL from both being authoritative at the same time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PdfReference {
    #[default]
    Empty,
    Local(LocalFile),
    Url(String),
}

impl PdfReference {
    pub fn is_empty(&self) -> bool {
        match self {
            PdfReference::Empty => true,
            PdfReference::Local(_) => false,
            PdfReference::Url(url) => url.trim().is_empty(),
        }
    }

    pub fn local_file(&self) -> Option<&LocalFile> {
        match self {
            PdfReference::Local(file) => Some(file),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PdfReference::Url(url) => Some(url.as_str()),
            _ => None,
        }
    }
}

/// Supervision metadata for theses, dissertations and end-of-cycle works.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcademicInfo {
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub supervisor: String,
}

impl AcademicInfo {
    pub fn is_blank(&self) -> bool {
        [
            &self.student_name,
            &self.institution,
            &self.year,
            &self.supervisor,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

/// Mobile-money details for submitters who pay the fee. The amount and phone
/// number are kept as typed so validation can report on the raw input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentInfo {
    #[serde(default)]
    pub operator: MobileOperator,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub academic_info: AcademicInfo,
    #[serde(default)]
    pub pdf_reference: PdfReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_photo: Option<LocalFile>,
    #[serde(default)]
    pub payment_info: PaymentInfo,
    #[serde(default)]
    pub waiver_code: String,
}

impl SubmissionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_academic(&self) -> bool {
        self.document_type.is_academic()
    }

    /// Selects a local document, discarding any URL entered earlier.
    pub fn set_pdf_file(&mut self, file: LocalFile) {
        self.pdf_reference = PdfReference::Local(file);
    }

    /// Points the document at a hosted URL, discarding any selected file.
    /// A blank URL clears the reference.
    pub fn set_pdf_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.pdf_reference = if url.trim().is_empty() {
            PdfReference::Empty
        } else {
            PdfReference::Url(url.trim().to_string())
        };
    }

    pub fn clear_pdf(&mut self) {
        self.pdf_reference = PdfReference::Empty;
    }

    /// True when nothing has been entered yet.
    pub fn is_pristine(&self) -> bool {
        self == &SubmissionDraft::default()
    }
}
