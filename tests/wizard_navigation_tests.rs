mod common;

use std::sync::Arc;

use common::{
    fill_info, local_pdf, portrait, reach_payment, valid_payment, Fixture, RecordingObserver,
};
use pubflow_core::{JumpRefusal, Step, StepTransition};
use pubflow_domain::{DocumentType, Exemption, LocalFile, PaymentInfo, PdfReference};
use submission_core::{Advance, SubmissionError};

#[tokio::test]
async fn article_skips_academic_page() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    fill_info(&wizard, DocumentType::Article);
    wizard.attach_pdf(local_pdf()).expect("attach pdf");

    assert!(wizard.step_check(Step::Info).is_ok());
    assert_eq!(
        wizard.next().await.expect("next"),
        Advance::Moved {
            from: Step::Info,
            to: Step::Document
        }
    );
    assert_eq!(wizard.completed_steps(), vec![Step::Info]);
}

#[tokio::test]
async fn thesis_visits_academic_page_both_ways() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    fill_info(&wizard, DocumentType::Thesis);

    assert_eq!(
        wizard.next().await.expect("next"),
        Advance::Moved {
            from: Step::Info,
            to: Step::Academic
        }
    );
    assert!(wizard.can_advance(), "academic page never blocks");
    wizard.next().await.expect("leave academic");
    assert_eq!(wizard.current_step(), Step::Document);

    wizard.previous().expect("back");
    assert_eq!(wizard.current_step(), Step::Academic);
    wizard.previous().expect("back");
    assert_eq!(wizard.current_step(), Step::Info);
    assert_eq!(wizard.previous().expect("back"), StepTransition::Unchanged);
}

#[tokio::test]
async fn short_title_blocks_first_page() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    fill_info(&wizard, DocumentType::Article);
    wizard.set_title("   Court    ");

    let err = wizard.next().await.expect_err("blocked");
    match err {
        SubmissionError::Blocked { step, reason } => {
            assert_eq!(step, Step::Info);
            assert!(reason.message.contains("Title"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(wizard.current_step(), Step::Info);
}

#[tokio::test]
async fn jumps_follow_reached_pages() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    fill_info(&wizard, DocumentType::Article);

    assert_eq!(
        wizard.jump_to(Step::Info).expect("same page"),
        StepTransition::Unchanged
    );
    assert!(matches!(
        wizard.jump_to(Step::Payment),
        Err(SubmissionError::JumpRefused {
            reason: JumpRefusal::NotReached,
            ..
        })
    ));
    assert!(matches!(
        wizard.jump_to(Step::Academic),
        Err(SubmissionError::JumpRefused {
            reason: JumpRefusal::NotApplicable,
            ..
        })
    ));

    wizard.attach_pdf(local_pdf()).expect("attach pdf");
    wizard.next().await.expect("leave info");
    wizard.next().await.expect("leave document");
    wizard.jump_to(Step::Info).expect("jump back");
    assert_eq!(
        wizard.jump_to(Step::Document).expect("jump to reached page"),
        StepTransition::Moved {
            from: Step::Info,
            to: Step::Document
        }
    );
}

#[tokio::test]
async fn academic_page_is_reachable_from_info_by_jump() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    wizard.set_document_type(DocumentType::EndOfCycleWork);

    wizard.jump_to(Step::Academic).expect("jump");
    assert_eq!(wizard.current_step(), Step::Academic);
}

#[tokio::test]
async fn leaving_academic_type_on_academic_page_returns_to_info() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    let observer = Arc::new(RecordingObserver::default());
    wizard.subscribe(observer.clone());
    fill_info(&wizard, DocumentType::Dissertation);
    wizard.next().await.expect("next");

    wizard.set_document_type(DocumentType::Book);

    assert_eq!(wizard.current_step(), Step::Info);
    assert_eq!(observer.events(), vec!["step 1->2", "step 2->1"]);
}

#[tokio::test]
async fn rejected_files_leave_draft_untouched() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    wizard.set_pdf_url("https://example.org/crues.pdf");

    let word = LocalFile::new("/tmp/a.docx", "a.docx", "application/msword", 10);
    assert!(matches!(
        wizard.attach_pdf(word),
        Err(SubmissionError::Core(_))
    ));
    let huge = LocalFile::new("/tmp/big.pdf", "big.pdf", "application/pdf", 20 * 1024 * 1024 + 1);
    assert!(wizard.attach_pdf(huge).is_err());
    assert_eq!(
        wizard.draft().pdf_reference,
        PdfReference::Url("https://example.org/crues.pdf".into())
    );

    wizard.attach_pdf(local_pdf()).expect("attach pdf");
    assert_eq!(wizard.draft().pdf_reference.local_file(), Some(&local_pdf()));

    let not_image = LocalFile::new("/tmp/cv.pdf", "cv.pdf", "application/pdf", 10);
    assert!(wizard.attach_author_photo(not_image).is_err());
    wizard.attach_author_photo(portrait()).expect("attach photo");
    assert_eq!(wizard.draft().author_photo, Some(portrait()));
}

#[tokio::test]
async fn payment_page_requires_phone_and_amount_unless_exempt() {
    let fixture = Fixture::author();
    let (wizard, _handle) = fixture.mount().await;
    reach_payment(&wizard).await;

    wizard.set_payment_info(PaymentInfo {
        phone_number: "0812345678".into(),
        ..valid_payment()
    });
    assert!(!wizard.can_advance());

    wizard.set_payment_info(PaymentInfo {
        amount: "4,99".into(),
        ..valid_payment()
    });
    assert!(!wizard.can_advance());

    wizard.set_payment_info(valid_payment());
    assert!(wizard.can_advance());
    assert_eq!(wizard.exemption(), Exemption::None);
}

#[tokio::test]
async fn administrators_skip_payment() {
    let fixture = Fixture::administrator();
    let (wizard, _handle) = fixture.mount().await;
    reach_payment(&wizard).await;

    assert_eq!(wizard.exemption(), Exemption::Administrator);
    assert!(wizard.can_advance());
}
