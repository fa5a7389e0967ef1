//! Commit orchestration: turns a validated draft into a publication record.
//!
//! The sequence is strictly ordered and stops at the first failure:
//!
//! 1. upload the local document, if one was picked;
//! 2. consume the verified waiver code, if the submitter is exempt through one;
//! 3. upload the author photo, if one was attached;
//! 4. create the publication record.
//!
//! Nothing is rolled back. Uploads finished before a failure are left behind
//! and every attempt writes to freshly named destinations, so a retry always
//! re-runs the whole sequence from the first step. The only exception is a
//! waiver already consumed by an earlier attempt for the same draft, which is
//! not consumed twice.

use pubflow_domain::{
    Exemption, Identity, LocalFile, NewPublication, PdfReference, PublicationStatus, RecordId,
    SubmissionDraft, SubmissionOutcome,
};
use uuid::Uuid;

use crate::backend::Collaborators;
use crate::error::CoreError;
use crate::failure::describe_failure;
use crate::waiver_service::WaiverService;

pub const DEFAULT_DOCUMENT_FOLDER: &str = "publications";
pub const DEFAULT_PHOTO_FOLDER: &str = "authors";

/// Storage folders uploads are written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFolders {
    pub documents: String,
    pub photos: String,
}

impl Default for UploadFolders {
    fn default() -> Self {
        Self {
            documents: DEFAULT_DOCUMENT_FOLDER.to_string(),
            photos: DEFAULT_PHOTO_FOLDER.to_string(),
        }
    }
}

/// Inputs for one commit attempt.
#[derive(Debug, Clone, Copy)]
pub struct CommitRequest<'a> {
    pub draft: &'a SubmissionDraft,
    pub author: Option<&'a Identity>,
    pub exemption: &'a Exemption,
    /// Administrator choice to publish without moderation.
    pub publish_immediately: bool,
    /// The exemption's waiver code was already spent by an earlier attempt.
    pub waiver_already_consumed: bool,
}

/// What one attempt did, whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub outcome: SubmissionOutcome,
    /// Waiver code invalidated during this attempt.
    pub consumed_waiver: Option<String>,
    /// URLs written by this attempt, including ones orphaned by a later failure.
    pub uploaded: Vec<String>,
}

#[derive(Default)]
struct AttemptLog {
    consumed_waiver: Option<String>,
    uploaded: Vec<String>,
}

pub struct CommitOrchestrator {
    collaborators: Collaborators,
    folders: UploadFolders,
}

impl CommitOrchestrator {
    pub fn new(collaborators: Collaborators, folders: UploadFolders) -> Self {
        Self {
            collaborators,
            folders,
        }
    }

    /// Runs the full sequence. Every failure is caught here and reported as a
    /// retryable [`SubmissionOutcome::Failure`]; the draft is never touched.
    pub async fn commit(&self, request: CommitRequest<'_>) -> CommitReport {
        let mut log = AttemptLog::default();
        let outcome = match self.run(request, &mut log).await {
            Ok(record_id) => {
                tracing::info!(record_id = %record_id, "publication record created");
                SubmissionOutcome::Success { record_id }
            }
            Err(err) => {
                if !log.uploaded.is_empty() {
                    tracing::warn!(
                        orphaned = log.uploaded.len(),
                        "commit failed after uploads; leaving uploaded files in place"
                    );
                }
                tracing::warn!(error = %err, "submission commit failed");
                SubmissionOutcome::failure(describe_failure(&err))
            }
        };
        CommitReport {
            outcome,
            consumed_waiver: log.consumed_waiver,
            uploaded: log.uploaded,
        }
    }

    async fn run(
        &self,
        request: CommitRequest<'_>,
        log: &mut AttemptLog,
    ) -> Result<RecordId, CoreError> {
        let draft = request.draft;
        let author = request.author.ok_or(CoreError::NotAuthenticated)?;

        let pdf_url = match &draft.pdf_reference {
            PdfReference::Local(file) => {
                let destination = upload_destination(&self.folders.documents, author, file);
                tracing::info!(destination = %destination, "uploading document");
                let url = self
                    .collaborators
                    .files
                    .upload_file(file, &destination)
                    .await
                    .map_err(CoreError::Upload)?;
                log.uploaded.push(url.clone());
                url
            }
            PdfReference::Url(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => return Err(CoreError::MissingDocument),
        };

        if let Some(code) = request.exemption.waiver_code() {
            if draft.waiver_code.trim() != code {
                return Err(CoreError::WaiverChanged(draft.waiver_code.trim().to_string()));
            }
            if !request.waiver_already_consumed {
                self.spend_waiver(code).await?;
                log.consumed_waiver = Some(code.to_string());
            }
        }

        let author_photo_url = match &draft.author_photo {
            Some(photo) => {
                let destination = upload_destination(&self.folders.photos, author, photo);
                tracing::info!(destination = %destination, "uploading author photo");
                let url = self
                    .collaborators
                    .files
                    .upload_file(photo, &destination)
                    .await
                    .map_err(CoreError::PhotoUpload)?;
                log.uploaded.push(url.clone());
                Some(url)
            }
            None => None,
        };

        let status = if request.publish_immediately && author.is_administrator() {
            PublicationStatus::Published
        } else {
            PublicationStatus::Pending
        };
        let fields = NewPublication {
            title: draft.title.trim().to_string(),
            summary: draft.summary.trim().to_string(),
            domain: draft.domain,
            document_type: draft.document_type,
            academic_info: draft.is_academic().then(|| draft.academic_info.clone()),
            pdf_url,
            author_photo_url,
            author_id: author.id,
            status,
            payment: (!request.exemption.is_exempt()).then(|| draft.payment_info.clone()),
            waiver_code: request.exemption.waiver_code().map(str::to_string),
        };
        self.collaborators
            .records
            .create_publication_record(&fields)
            .await
            .map_err(CoreError::RecordCreate)
    }

    /// Re-checks the code right before spending it, then consumes it.
    async fn spend_waiver(&self, code: &str) -> Result<(), CoreError> {
        let waivers = &self.collaborators.waivers;
        if !WaiverService::check(waivers.as_ref(), code).await? {
            return Err(CoreError::WaiverRejected(code.to_string()));
        }
        let consumed = waivers
            .consume_waiver_code(code)
            .await
            .map_err(CoreError::WaiverConsume)?;
        if !consumed.success {
            return Err(CoreError::WaiverNotConsumed(code.to_string()));
        }
        tracing::info!("waiver code consumed");
        Ok(())
    }
}

/// `folder/author-id/random-file_name`, unique per call.
pub fn upload_destination(folder: &str, author: &Identity, file: &LocalFile) -> String {
    format!(
        "{}/{}/{}-{}",
        folder.trim_matches('/'),
        author.id,
        Uuid::new_v4(),
        sanitize_file_name(&file.file_name)
    )
}

fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !sanitized.is_empty() && !last_dash {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        "file".into()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_are_fresh_per_call() {
        let author = Identity::author(Uuid::new_v4());
        let file = LocalFile::new("/tmp/x.pdf", "Mon Mémoire final.pdf", "application/pdf", 1);
        let first = upload_destination("publications/", &author, &file);
        let second = upload_destination("publications", &author, &file);

        assert_ne!(first, second);
        assert!(first.starts_with(&format!("publications/{}/", author.id)));
        assert!(first.ends_with("-mon-m-moire-final.pdf"), "{first}");
    }

    #[test]
    fn sanitize_falls_back_for_empty_names() {
        assert_eq!(sanitize_file_name("  ***  "), "file");
    }
}
