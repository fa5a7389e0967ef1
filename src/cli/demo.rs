//! `demo`: one complete submission against in-memory services.

use std::sync::Arc;

use pubflow_core::Step;
use pubflow_domain::{
    AcademicInfo, DocumentType, Domain, Identity, LocalFile, RecordId, SubmissionOutcome,
};
use uuid::Uuid;

use super::{output, CliError};
use crate::backend::{MemoryBackend, MemoryDraftStore};
use crate::wizard::{Advance, SubmissionWizard, WizardObserver, WizardSettings};

const DEMO_WAIVER: &str = "DEMO-WAIVER-2026";

struct ConsoleObserver;

impl WizardObserver for ConsoleObserver {
    fn on_step_change(&self, from: Step, to: Step) {
        output::info(format!("{} -> {}", from.label(), to.label()));
    }

    fn on_success(&self, record_id: &RecordId) {
        output::success(format!("Publication record created: {record_id}"));
    }

    fn on_failure(&self, reason: &str) {
        output::warning(format!("Submission failed: {reason}"));
    }
}

pub async fn run_demo() -> Result<(), CliError> {
    let author = Identity::author(Uuid::new_v4());
    let backend = MemoryBackend::new(Some(author));
    backend.waivers.issue([DEMO_WAIVER]);
    let store = Arc::new(MemoryDraftStore::new());

    output::section("Demo submission");
    let (wizard, handle) = SubmissionWizard::mount(
        backend.collaborators(),
        store.clone(),
        WizardSettings::default(),
    )
    .await;
    wizard.subscribe(Arc::new(ConsoleObserver));

    wizard.set_title("Gestion durable des forêts du Mayombe");
    wizard.set_summary(
        "Analyse de vingt ans de données d'inventaire forestier et propositions de gestion.",
    );
    wizard.set_domain(Domain::Agriculture);
    wizard.set_document_type(DocumentType::Dissertation);
    wizard.next().await?;

    wizard.set_academic_info(AcademicInfo {
        student_name: "Demo Student".into(),
        institution: "Université de Kinshasa".into(),
        year: "2026".into(),
        supervisor: "Prof. Demo".into(),
    });
    wizard.next().await?;

    wizard.attach_pdf(LocalFile::new(
        "demo/memoire.pdf",
        "memoire.pdf",
        "application/pdf",
        2_400_000,
    ))?;
    wizard.next().await?;

    wizard.set_waiver_code(DEMO_WAIVER);
    let status = wizard.verify_waiver().await?;
    output::info(format!("Waiver code status: {status:?}"));

    let outcome = match wizard.next().await? {
        Advance::Submitted(outcome) => outcome,
        other => {
            handle.unmount().await;
            return Err(CliError::Demo(format!(
                "stopped before submitting: {other:?}"
            )));
        }
    };
    handle.unmount().await;

    for upload in backend.files.uploads() {
        output::field("Uploaded", upload.url);
    }
    output::field("Waivers consumed", backend.waivers.consumed().join(", "));
    output::field("Stored drafts left", store.len());
    match outcome {
        SubmissionOutcome::Success { .. } => Ok(()),
        SubmissionOutcome::Failure { reason, .. } => Err(CliError::Demo(reason)),
    }
}
