mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fill_info, local_pdf, reach_payment, temp_dir, Fixture};
use pubflow_core::{DraftStore, Step};
use pubflow_domain::{
    DocumentType, DraftKey, DraftSnapshot, Exemption, Identity, SubmissionDraft, WaiverStatus,
};
use pubflow_storage_json::JsonDraftStore;
use submission_core::{Advance, SubmissionWizard, WizardSettings};
use uuid::Uuid;

fn saved_draft() -> SubmissionDraft {
    let mut draft = SubmissionDraft::new();
    draft.title = common::TITLE.into();
    draft.summary = common::SUMMARY.into();
    draft.set_pdf_file(local_pdf());
    draft.waiver_code = "WAIVE-2026-001".into();
    draft
}

#[tokio::test]
async fn mount_restores_the_identity_snapshot_once() {
    let fixture = Fixture::author();
    let identity = fixture.identity.clone().expect("author");
    let key = DraftKey::for_identity(Some(&identity));
    let snapshot = DraftSnapshot::new(Some(identity.id), saved_draft(), 3);
    fixture.store.save_snapshot(&key, &snapshot).expect("seed");

    let (wizard, _handle) = fixture.mount().await;

    assert_eq!(wizard.draft(), saved_draft());
    assert_eq!(wizard.current_step(), Step::Document);
    assert_eq!(wizard.snapshot(), snapshot);
    assert_eq!(
        wizard.waiver_status(),
        pubflow_domain::WaiverStatus::Unchecked
    );
}

#[tokio::test]
async fn snapshot_from_another_identity_is_discarded() {
    let fixture = Fixture::author();
    let identity = fixture.identity.clone().expect("author");
    let key = DraftKey::for_identity(Some(&identity));
    let foreign = DraftSnapshot::new(Some(Uuid::new_v4()), saved_draft(), 3);
    fixture.store.save_snapshot(&key, &foreign).expect("seed");

    let (wizard, _handle) = fixture.mount().await;

    assert!(wizard.draft().is_pristine());
    assert_eq!(wizard.current_step(), Step::Info);
    assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn unreadable_snapshot_is_ignored() {
    let fixture = Fixture::anonymous();
    fixture
        .store
        .insert_raw(&DraftKey::anonymous(), "{ \"draft\": 42");

    let (wizard, _handle) = fixture.mount().await;

    assert!(wizard.draft().is_pristine());
    assert_eq!(wizard.current_step(), Step::Info);
}

#[tokio::test]
async fn restored_academic_step_falls_back_for_other_types() {
    let fixture = Fixture::anonymous();
    let snapshot = DraftSnapshot::new(None, saved_draft(), 2);
    fixture
        .store
        .save_snapshot(&DraftKey::anonymous(), &snapshot)
        .expect("seed");

    let (wizard, _handle) = fixture.mount().await;

    assert_eq!(wizard.current_step(), Step::Info);
}

#[tokio::test(start_paused = true)]
async fn autosave_without_edits_rewrites_identical_content() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    fill_info(&wizard, DocumentType::Article);
    let key = wizard.draft_key();

    tokio::time::sleep(Duration::from_secs(6)).await;
    let first = fixture.store.raw(&key).expect("first write");
    tokio::time::sleep(Duration::from_secs(5)).await;
    let second = fixture.store.raw(&key).expect("second write");

    assert_eq!(fixture.store.writes(), 2);
    assert_eq!(first, second);
    assert_eq!(fixture.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn autosave_picks_up_latest_edits() {
    let fixture = Fixture::anonymous();
    let (wizard, _handle) = fixture.mount().await;

    wizard.set_title("Premier titre provisoire");
    tokio::time::sleep(Duration::from_secs(6)).await;
    wizard.set_title("Titre définitif de la publication");
    tokio::time::sleep(Duration::from_secs(5)).await;

    let stored = fixture
        .store
        .load_snapshot(&DraftKey::anonymous())
        .expect("load")
        .expect("stored");
    assert_eq!(stored.draft.title, "Titre définitif de la publication");
    assert_eq!(stored.owner, None);
}

#[tokio::test(start_paused = true)]
async fn autosave_survives_write_failures() {
    let fixture = Fixture::anonymous();
    let (wizard, _handle) = fixture.mount().await;
    wizard.set_title("Titre de travail assez long");
    fixture.store.set_failure(Some("disk full"));

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(fixture.store.writes(), 0);

    fixture.store.set_failure(None);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fixture.store.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn unmount_stops_autosave() {
    let fixture = Fixture::anonymous();
    let (wizard, handle) = fixture.mount().await;
    wizard.set_title("Titre de travail assez long");
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(fixture.store.writes(), 1);

    handle.unmount().await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(fixture.store.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn identity_change_switches_namespace() {
    let fixture = Fixture::anonymous();
    let (wizard, _handle) = fixture.mount().await;
    wizard.set_title("Brouillon anonyme en cours");

    let author = Identity::author(Uuid::new_v4());
    let author_key = DraftKey::for_identity(Some(&author));
    fixture
        .store
        .save_snapshot(
            &author_key,
            &DraftSnapshot::new(Some(author.id), saved_draft(), 3),
        )
        .expect("seed");
    fixture.backend.identity.set(Some(author.clone()));

    assert!(wizard.refresh_identity().await.expect("refresh"));
    assert!(!wizard.refresh_identity().await.expect("unchanged"));

    assert_eq!(wizard.identity(), Some(author));
    assert_eq!(wizard.draft_key(), author_key);
    assert_eq!(wizard.draft(), saved_draft());

    wizard.set_title("Titre mis à jour après connexion");
    tokio::time::sleep(Duration::from_secs(6)).await;
    let stored = fixture
        .store
        .load_snapshot(&author_key)
        .expect("load")
        .expect("stored");
    assert_eq!(stored.draft.title, "Titre mis à jour après connexion");
}

#[tokio::test(start_paused = true)]
async fn json_store_round_trips_through_a_remount() {
    let store = Arc::new(JsonDraftStore::new(temp_dir().join("drafts")).expect("store"));
    let fixture = Fixture::author();

    let (wizard, handle) = SubmissionWizard::mount(
        fixture.backend.collaborators(),
        store.clone(),
        WizardSettings::default(),
    )
    .await;
    fill_info(&wizard, DocumentType::Thesis);
    wizard.next().await.expect("next");
    tokio::time::sleep(Duration::from_secs(6)).await;
    let expected = wizard.snapshot();
    handle.unmount().await;

    assert!(store.snapshot_path(&wizard.draft_key()).exists());
    let (restored, _handle) = SubmissionWizard::mount(
        fixture.backend.collaborators(),
        store.clone(),
        WizardSettings::default(),
    )
    .await;

    assert_eq!(restored.snapshot(), expected);
    assert_eq!(restored.current_step(), Step::Academic);
}

#[tokio::test(start_paused = true)]
async fn waiver_spent_by_a_failed_commit_survives_a_reload() {
    const CODE: &str = "WAIVE-2026-001";
    let fixture = Fixture::author();
    fixture.backend.waivers.issue([CODE]);
    let (wizard, handle) = fixture.mount().await;
    reach_payment(&wizard).await;
    wizard.set_waiver_code(CODE);
    wizard.verify_waiver().await.expect("verify");
    fixture
        .backend
        .records
        .set_failure(Some("connection reset by peer"));

    let first = wizard.submit().await.expect("submit runs");
    assert!(!first.is_success());
    assert_eq!(fixture.backend.waivers.consumed(), vec![CODE.to_string()]);
    tokio::time::sleep(Duration::from_secs(6)).await;
    handle.unmount().await;

    let stored = fixture
        .store
        .load_snapshot(&wizard.draft_key())
        .expect("load")
        .expect("stored");
    assert_eq!(stored.consumed_waiver.as_deref(), Some(CODE));

    fixture.backend.records.set_failure(None);
    let (reloaded, _handle) = fixture.mount().await;
    assert_eq!(reloaded.current_step(), Step::Payment);
    assert_eq!(
        reloaded.verify_waiver().await.expect("verify"),
        WaiverStatus::Valid
    );
    assert_eq!(fixture.backend.waivers.checks().len(), 2, "spent code not re-sent");
    assert_eq!(reloaded.exemption(), Exemption::VerifiedWaiver(CODE.into()));

    let outcome = match reloaded.next().await.expect("submit") {
        Advance::Submitted(outcome) => outcome,
        other => panic!("expected a submission, got {other:?}"),
    };
    assert!(outcome.is_success());
    assert_eq!(fixture.backend.waivers.consumed().len(), 1);
    let (_, fields) = &fixture.backend.records.created()[0];
    assert_eq!(fields.waiver_code.as_deref(), Some(CODE));
    assert_eq!(fields.payment, None);
}

#[tokio::test(start_paused = true)]
async fn zero_autosave_interval_uses_the_minimum_period() {
    let fixture = Fixture::author();
    let settings = WizardSettings {
        autosave_interval: Duration::ZERO,
        ..WizardSettings::default()
    };
    let (wizard, _handle) = SubmissionWizard::mount(
        fixture.backend.collaborators(),
        fixture.store.clone(),
        settings,
    )
    .await;
    wizard.set_title(common::TITLE);

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(fixture.store.writes(), 1);
    let stored = fixture
        .store
        .load_snapshot(&wizard.draft_key())
        .expect("load")
        .expect("stored");
    assert_eq!(stored.draft.title, common::TITLE);
}
