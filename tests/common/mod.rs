#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use pubflow_core::Step;
use pubflow_domain::{
    DocumentType, Identity, LocalFile, MobileOperator, PaymentInfo, RecordId,
};
use submission_core::backend::{MemoryBackend, MemoryDraftStore};
use submission_core::{MountHandle, SubmissionWizard, WizardObserver, WizardSettings};
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// 52 characters once trimmed.
pub const SUMMARY: &str = "Étude des crues du fleuve Congo, entre 1990 et 2020.";
pub const TITLE: &str = "Hydrologie du bassin du Congo";

/// Creates a unique directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn local_pdf() -> LocalFile {
    LocalFile::new("/tmp/crues.pdf", "crues.pdf", "application/pdf", 1_048_576)
}

pub fn portrait() -> LocalFile {
    LocalFile::new("/tmp/portrait.jpg", "portrait.jpg", "image/jpeg", 204_800)
}

pub fn valid_payment() -> PaymentInfo {
    PaymentInfo {
        operator: MobileOperator::AirtelMoney,
        amount: "10".into(),
        phone_number: "+243 970 000 111".into(),
        ..PaymentInfo::default()
    }
}

/// In-memory services plus a draft store, for one signed-in identity or
/// none.
pub struct Fixture {
    pub identity: Option<Identity>,
    pub backend: MemoryBackend,
    pub store: Arc<MemoryDraftStore>,
}

impl Fixture {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            backend: MemoryBackend::new(identity.clone()),
            identity,
            store: Arc::new(MemoryDraftStore::new()),
        }
    }

    pub fn author() -> Self {
        Self::new(Some(Identity::author(Uuid::new_v4())))
    }

    pub fn administrator() -> Self {
        Self::new(Some(Identity::administrator(Uuid::new_v4())))
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub async fn mount(&self) -> (SubmissionWizard, MountHandle) {
        SubmissionWizard::mount(
            self.backend.collaborators(),
            self.store.clone(),
            WizardSettings::default(),
        )
        .await
    }
}

/// Fills the first page so that its validator passes.
pub fn fill_info(wizard: &SubmissionWizard, document_type: DocumentType) {
    wizard.set_title(TITLE);
    wizard.set_summary(SUMMARY);
    wizard.set_document_type(document_type);
}

/// Drives an article from the first page to the payment page.
pub async fn reach_payment(wizard: &SubmissionWizard) {
    fill_info(wizard, DocumentType::Article);
    wizard.attach_pdf(local_pdf()).expect("attach pdf");
    wizard.next().await.expect("leave info");
    wizard.next().await.expect("leave document");
    assert_eq!(wizard.current_step(), Step::Payment);
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock events").clone()
    }
}

impl WizardObserver for RecordingObserver {
    fn on_step_change(&self, from: Step, to: Step) {
        self.events
            .lock()
            .expect("lock events")
            .push(format!("step {}->{}", from.number(), to.number()));
    }

    fn on_success(&self, record_id: &RecordId) {
        self.events
            .lock()
            .expect("lock events")
            .push(format!("success {record_id}"));
    }

    fn on_failure(&self, reason: &str) {
        self.events
            .lock()
            .expect("lock events")
            .push(format!("failure {reason}"));
    }
}
