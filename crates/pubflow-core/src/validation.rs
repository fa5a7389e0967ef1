//! Field validators gating progression through the wizard.
//!
//! Every function here is pure over its inputs and cheap enough to run on
//! each keystroke.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use pubflow_domain::{Exemption, LocalFile, SubmissionDraft};

use crate::error::CoreError;
use crate::steps::Step;

pub const MIN_TITLE_CHARS: usize = 10;
pub const MIN_SUMMARY_CHARS: usize = 50;
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const MAX_PDF_BYTES: u64 = 20 * 1024 * 1024;
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_COUNTRY_CODE: &str = "243";
pub const MINIMUM_AMOUNT: f64 = 5.0;

#[allow(clippy::expect_used)]
static NATIONAL_MOBILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[89]\d{8}$").expect("compile regex"));

/// Why a step cannot be left yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A file refused at selection time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FileRejection {
    #[error("`{file_name}` is {found}, expected {expected}")]
    WrongType {
        file_name: String,
        expected: String,
        found: String,
    },
    #[error("`{file_name}` is {size_bytes} bytes, the limit is {limit_bytes} bytes")]
    TooLarge {
        file_name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },
}

/// Limits applied by the validators.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    max_pdf_bytes: u64,
    max_photo_bytes: u64,
    minimum_amount: f64,
    country_code: String,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_pdf_bytes: MAX_PDF_BYTES,
            max_photo_bytes: MAX_PHOTO_BYTES,
            minimum_amount: MINIMUM_AMOUNT,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl ValidationPolicy {
    pub fn new(
        max_pdf_bytes: u64,
        max_photo_bytes: u64,
        minimum_amount: f64,
        country_code: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let country_code = country_code.into();
        let country_code = country_code.trim().trim_start_matches('+').to_string();
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::InvalidPolicy(format!(
                "country code `{country_code}` must be digits"
            )));
        }
        if max_pdf_bytes == 0 || max_photo_bytes == 0 {
            return Err(CoreError::InvalidPolicy(
                "file size limits must be greater than zero".into(),
            ));
        }
        if !minimum_amount.is_finite() || minimum_amount < 0.0 {
            return Err(CoreError::InvalidPolicy(
                "minimum amount must be a non-negative number".into(),
            ));
        }
        Ok(Self {
            max_pdf_bytes,
            max_photo_bytes,
            minimum_amount,
            country_code,
        })
    }

    pub fn max_pdf_bytes(&self) -> u64 {
        self.max_pdf_bytes
    }

    pub fn max_photo_bytes(&self) -> u64 {
        self.max_photo_bytes
    }

    pub fn minimum_amount(&self) -> f64 {
        self.minimum_amount
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }
}

/// Checks a document picked for upload. Runs at selection time, so the draft
/// never holds a file that would be refused later.
pub fn accept_pdf(file: &LocalFile, policy: &ValidationPolicy) -> Result<(), FileRejection> {
    if file.mime_type != PDF_MIME_TYPE {
        return Err(FileRejection::WrongType {
            file_name: file.file_name.clone(),
            expected: PDF_MIME_TYPE.to_string(),
            found: display_mime(&file.mime_type),
        });
    }
    if file.size_bytes > policy.max_pdf_bytes {
        return Err(FileRejection::TooLarge {
            file_name: file.file_name.clone(),
            size_bytes: file.size_bytes,
            limit_bytes: policy.max_pdf_bytes,
        });
    }
    Ok(())
}

pub fn accept_author_photo(
    file: &LocalFile,
    policy: &ValidationPolicy,
) -> Result<(), FileRejection> {
    if !file.mime_type.starts_with("image/") {
        return Err(FileRejection::WrongType {
            file_name: file.file_name.clone(),
            expected: "an image".to_string(),
            found: display_mime(&file.mime_type),
        });
    }
    if file.size_bytes > policy.max_photo_bytes {
        return Err(FileRejection::TooLarge {
            file_name: file.file_name.clone(),
            size_bytes: file.size_bytes,
            limit_bytes: policy.max_photo_bytes,
        });
    }
    Ok(())
}

fn display_mime(mime: &str) -> String {
    if mime.trim().is_empty() {
        "of unknown type".to_string()
    } else {
        mime.to_string()
    }
}

pub fn validate_info(draft: &SubmissionDraft) -> Result<(), ValidationError> {
    let title_len = draft.title.trim().chars().count();
    if title_len < MIN_TITLE_CHARS {
        return Err(ValidationError::new(format!(
            "Title must be at least {MIN_TITLE_CHARS} characters ({title_len} entered)"
        )));
    }
    let summary_len = draft.summary.trim().chars().count();
    if summary_len < MIN_SUMMARY_CHARS {
        return Err(ValidationError::new(format!(
            "Summary must be at least {MIN_SUMMARY_CHARS} characters ({summary_len} entered)"
        )));
    }
    Ok(())
}

/// Academic details are optional; the page never blocks.
pub fn validate_academic(_draft: &SubmissionDraft) -> Result<(), ValidationError> {
    Ok(())
}

pub fn validate_document(draft: &SubmissionDraft) -> Result<(), ValidationError> {
    if draft.pdf_reference.is_empty() {
        return Err(ValidationError::new(
            "Attach a PDF file or enter the document URL",
        ));
    }
    Ok(())
}

pub fn validate_payment(
    draft: &SubmissionDraft,
    exemption: &Exemption,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    if exemption.is_exempt() {
        return Ok(());
    }
    let payment = &draft.payment_info;
    if !is_valid_phone(&payment.phone_number, policy) {
        return Err(ValidationError::new(format!(
            "Enter a 9-digit mobile number starting with 8 or 9 (optionally prefixed with +{})",
            policy.country_code
        )));
    }
    match parse_amount(&payment.amount) {
        Some(amount) if amount >= policy.minimum_amount => Ok(()),
        Some(_) => Err(ValidationError::new(format!(
            "Amount must be at least {} {}",
            policy.minimum_amount, payment.currency
        ))),
        None => Err(ValidationError::new("Enter a numeric amount")),
    }
}

/// Validator for `step`, dispatching to the per-page predicates.
pub fn validate_step(
    step: Step,
    draft: &SubmissionDraft,
    exemption: &Exemption,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    match step {
        Step::Info => validate_info(draft),
        Step::Academic => validate_academic(draft),
        Step::Document => validate_document(draft),
        Step::Payment => validate_payment(draft, exemption, policy),
    }
}

pub fn can_advance(
    step: Step,
    draft: &SubmissionDraft,
    exemption: &Exemption,
    policy: &ValidationPolicy,
) -> bool {
    validate_step(step, draft, exemption, policy).is_ok()
}

/// Accepts `8XXXXXXXX`/`9XXXXXXXX`, optionally prefixed with the country code
/// (with or without `+`). Spaces, dots, dashes and parentheses are ignored.
pub fn is_valid_phone(raw: &str, policy: &ValidationPolicy) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '.' | '(' | ')'))
        .collect();
    let code = policy.country_code.as_str();
    let national = match compact.strip_prefix('+') {
        Some(rest) => match rest.strip_prefix(code) {
            Some(national) => national,
            None => return false,
        },
        None if compact.len() == code.len() + 9 => match compact.strip_prefix(code) {
            Some(national) => national,
            None => return false,
        },
        None => compact.as_str(),
    };
    NATIONAL_MOBILE_NUMBER.is_match(national)
}

/// Parses a user-entered amount, accepting a decimal comma.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}
