//! Stateful facade driving one submission from the first keystroke to the
//! created record.
//!
//! A [`SubmissionWizard`] is a cheap, cloneable handle. Field mutators are
//! synchronous; calls that reach a collaborator are async and guarded so only
//! one of them runs at a time. Progression is refused with
//! [`SubmissionError::Busy`] while one is in flight.

mod navigation;
mod observer;
mod submit;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pubflow_config::Config;
use pubflow_core::{
    accept_author_photo, accept_pdf, applicable_steps, validate_step, Collaborators,
    CommitOrchestrator, CoreError, DraftStore, Step, StepMachine, UploadFolders, ValidationError,
    ValidationPolicy,
};
use pubflow_domain::{
    AcademicInfo, DocumentType, Domain, DraftKey, DraftSnapshot, Exemption, Identity, LocalFile,
    PaymentInfo, SubmissionDraft, SubmissionOutcome, WaiverStatus, WaiverVerification,
};
use tokio::sync::watch;

use crate::autosave::{spawn_autosave, AutosaveHandle};
use crate::errors::SubmissionError;

pub use navigation::Advance;
pub use observer::WizardObserver;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Limits and locations a wizard runs with.
#[derive(Debug, Clone)]
pub struct WizardSettings {
    pub policy: ValidationPolicy,
    pub folders: UploadFolders,
    pub autosave_interval: Duration,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            folders: UploadFolders::default(),
            autosave_interval: Duration::from_secs(Config::default_autosave_interval_secs()),
        }
    }
}

impl WizardSettings {
    pub fn from_config(config: &Config) -> Result<Self, SubmissionError> {
        config.validate()?;
        Ok(Self {
            policy: config.validation_policy()?,
            folders: config.upload_folders(),
            autosave_interval: config.autosave_interval(),
        })
    }
}

struct WizardState {
    identity: Option<Identity>,
    key: DraftKey,
    draft: SubmissionDraft,
    machine: StepMachine,
    waiver: WaiverVerification,
    /// Code spent by an earlier failed attempt on this draft.
    consumed_waiver: Option<String>,
    publish_immediately: bool,
    last_outcome: Option<SubmissionOutcome>,
    completed: bool,
}

impl WizardState {
    fn fresh(identity: Option<Identity>) -> Self {
        let key = DraftKey::for_identity(identity.as_ref());
        Self {
            identity,
            key,
            draft: SubmissionDraft::new(),
            machine: StepMachine::new(),
            waiver: WaiverVerification::default(),
            consumed_waiver: None,
            publish_immediately: false,
            last_outcome: None,
            completed: false,
        }
    }

    /// Loads the identity's stored draft, once. Anything unreadable is
    /// ignored; a draft saved by someone else is discarded.
    fn restore(store: &dyn DraftStore, identity: Option<Identity>) -> Self {
        let mut state = Self::fresh(identity);
        match store.load_snapshot(&state.key) {
            Ok(Some(snapshot)) if snapshot.belongs_to(state.identity.as_ref()) => {
                match Step::from_number(snapshot.step) {
                    Some(step) => {
                        tracing::info!(key = %state.key, step = step.number(), "draft restored");
                        state.apply(snapshot.draft, step, snapshot.consumed_waiver);
                    }
                    None => tracing::warn!(key = %state.key, "ignoring draft with unknown step"),
                }
            }
            Ok(Some(_)) => {
                tracing::warn!(key = %state.key, "discarding draft saved by another identity");
                if let Err(err) = store.clear_snapshot(&state.key) {
                    tracing::warn!(key = %state.key, error = %err, "could not clear foreign draft");
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(key = %state.key, error = %err, "ignoring unreadable draft snapshot")
            }
        }
        state
    }

    fn apply(&mut self, draft: SubmissionDraft, step: Step, consumed_waiver: Option<String>) {
        let step = if step.is_applicable(&draft) {
            step
        } else {
            Step::FIRST
        };
        self.waiver = WaiverVerification::new(draft.waiver_code.clone());
        self.machine = StepMachine::restore(step);
        self.consumed_waiver = consumed_waiver;
        self.draft = draft;
    }

    fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot::new(
            self.identity.as_ref().map(|identity| identity.id),
            self.draft.clone(),
            self.machine.current().number(),
        )
        .with_consumed_waiver(self.consumed_waiver.clone())
    }

    /// Whether `code` was already spent by an earlier attempt on this draft.
    fn spent(&self, code: &str) -> bool {
        self.consumed_waiver.as_deref() == Some(code)
    }

    fn exemption(&self) -> Exemption {
        if self
            .identity
            .as_ref()
            .is_some_and(Identity::is_administrator)
        {
            return Exemption::Administrator;
        }
        if let Some(code) = self.waiver.verified_code() {
            return Exemption::VerifiedWaiver(code.to_string());
        }
        let code = self.waiver.code().trim();
        if self.spent(code) {
            return Exemption::VerifiedWaiver(code.to_string());
        }
        Exemption::None
    }

    fn check(&self, step: Step, policy: &ValidationPolicy) -> Result<(), ValidationError> {
        validate_step(step, &self.draft, &self.exemption(), policy)
    }
}

struct Shared {
    settings: WizardSettings,
    collaborators: Collaborators,
    orchestrator: CommitOrchestrator,
    store: Arc<dyn DraftStore>,
    state: Mutex<WizardState>,
    snapshots: watch::Sender<DraftSnapshot>,
    autosave: Mutex<Option<AutosaveHandle>>,
    observers: Mutex<Vec<Arc<dyn WizardObserver>>>,
    mounted: AtomicBool,
    in_flight: AtomicBool,
}

impl Shared {
    fn start_autosave(&self, key: DraftKey) {
        let handle = spawn_autosave(
            self.store.clone(),
            key,
            self.snapshots.subscribe(),
            self.settings.autosave_interval,
        );
        if let Some(previous) = lock(&self.autosave).replace(handle) {
            previous.cancel();
        }
    }

    async fn stop_autosave(&self) {
        let handle = lock(&self.autosave).take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }
}

/// Keeps a wizard mounted. Releasing it stops autosave and silences every
/// callback, including ones from calls still in flight.
///
/// Dropping the handle only signals the autosave task; [`Self::unmount`]
/// also waits for it. A commit still in flight joins the signalled task
/// before it clears the stored draft, so either way no late write survives a
/// successful submission.
pub struct MountHandle {
    shared: Arc<Shared>,
}

impl MountHandle {
    /// Unmounts and waits for the autosave task to exit.
    pub async fn unmount(self) {
        self.shared.mounted.store(false, Ordering::Release);
        self.shared.stop_autosave().await;
        tracing::info!("submission wizard unmounted");
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.shared.mounted.store(false, Ordering::Release);
        // Left in place so a pending commit can still join it.
        if let Some(handle) = lock(&self.shared.autosave).as_ref() {
            handle.cancel();
        }
    }
}

struct CallGuard<'a>(&'a AtomicBool);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct SubmissionWizard {
    shared: Arc<Shared>,
}

impl SubmissionWizard {
    /// Looks up the current identity, restores that identity's draft if one
    /// is stored, and starts autosave. Must run inside a tokio runtime.
    pub async fn mount(
        collaborators: Collaborators,
        store: Arc<dyn DraftStore>,
        settings: WizardSettings,
    ) -> (Self, MountHandle) {
        let identity = collaborators.identity.current_identity().await;
        let state = WizardState::restore(store.as_ref(), identity);
        let key = state.key.clone();
        let (snapshots, _) = watch::channel(state.snapshot());
        let orchestrator = CommitOrchestrator::new(collaborators.clone(), settings.folders.clone());

        let shared = Arc::new(Shared {
            settings,
            collaborators,
            orchestrator,
            store,
            state: Mutex::new(state),
            snapshots,
            autosave: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
            mounted: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
        });
        shared.start_autosave(key.clone());
        tracing::info!(key = %key, "submission wizard mounted");

        (
            Self {
                shared: shared.clone(),
            },
            MountHandle { shared },
        )
    }

    pub fn subscribe(&self, observer: Arc<dyn WizardObserver>) {
        lock(&self.shared.observers).push(observer);
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.shared.settings
    }

    pub fn draft(&self) -> SubmissionDraft {
        lock(&self.shared.state).draft.clone()
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        lock(&self.shared.state).snapshot()
    }

    pub fn draft_key(&self) -> DraftKey {
        lock(&self.shared.state).key.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.shared.state).identity.clone()
    }

    pub fn current_step(&self) -> Step {
        lock(&self.shared.state).machine.current()
    }

    pub fn furthest_step(&self) -> Step {
        lock(&self.shared.state).machine.furthest()
    }

    pub fn applicable_steps(&self) -> Vec<Step> {
        applicable_steps(&lock(&self.shared.state).draft)
    }

    pub fn completed_steps(&self) -> Vec<Step> {
        let state = lock(&self.shared.state);
        state.machine.completed_steps(&state.draft)
    }

    pub fn waiver_status(&self) -> WaiverStatus {
        lock(&self.shared.state).waiver.status()
    }

    pub fn exemption(&self) -> Exemption {
        lock(&self.shared.state).exemption()
    }

    pub fn publish_immediately(&self) -> bool {
        lock(&self.shared.state).publish_immediately
    }

    pub fn last_outcome(&self) -> Option<SubmissionOutcome> {
        lock(&self.shared.state).last_outcome.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_completed(&self) -> bool {
        lock(&self.shared.state).completed
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update(|state| state.draft.title = title);
    }

    pub fn set_summary(&self, summary: impl Into<String>) {
        let summary = summary.into();
        self.update(|state| state.draft.summary = summary);
    }

    pub fn set_domain(&self, domain: Domain) {
        self.update(|state| state.draft.domain = domain);
    }

    /// Changing to a non-academic type while on the academic page moves the
    /// wizard back to the first page.
    pub fn set_document_type(&self, document_type: DocumentType) {
        self.update(|state| {
            state.draft.document_type = document_type;
            if !state.machine.current().is_applicable(&state.draft) {
                state.machine.previous(&state.draft);
            }
        });
    }

    pub fn set_academic_info(&self, info: AcademicInfo) {
        self.update(|state| state.draft.academic_info = info);
    }

    /// Selects a local document. Files that are not PDFs or exceed the size
    /// limit are refused and the current reference is kept.
    pub fn attach_pdf(&self, file: LocalFile) -> Result<(), SubmissionError> {
        accept_pdf(&file, &self.shared.settings.policy).map_err(CoreError::from)?;
        self.update(|state| state.draft.set_pdf_file(file));
        Ok(())
    }

    pub fn set_pdf_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.update(|state| state.draft.set_pdf_url(url));
    }

    pub fn clear_pdf(&self) {
        self.update(|state| state.draft.clear_pdf());
    }

    pub fn attach_author_photo(&self, file: LocalFile) -> Result<(), SubmissionError> {
        accept_author_photo(&file, &self.shared.settings.policy).map_err(CoreError::from)?;
        self.update(|state| state.draft.author_photo = Some(file));
        Ok(())
    }

    pub fn remove_author_photo(&self) {
        self.update(|state| state.draft.author_photo = None);
    }

    pub fn set_payment_info(&self, payment: PaymentInfo) {
        self.update(|state| state.draft.payment_info = payment);
    }

    /// Any edit, even to the same text, drops the verification back to
    /// unchecked.
    pub fn set_waiver_code(&self, code: impl Into<String>) {
        let code = code.into();
        self.update(|state| {
            state.waiver.edit(code.clone());
            state.draft.waiver_code = code;
        });
    }

    /// Administrator choice to skip moderation. Ignored for other roles.
    pub fn set_publish_immediately(&self, publish: bool) {
        self.update(|state| state.publish_immediately = publish);
    }

    /// Re-reads the current identity. When it changed, the wizard switches to
    /// the new identity's namespace: the in-memory draft is replaced by that
    /// identity's stored draft (or a fresh one) and autosave follows.
    pub async fn refresh_identity(&self) -> Result<bool, SubmissionError> {
        self.ensure_open()?;
        let _call = self.begin_call()?;
        let identity = self.shared.collaborators.identity.current_identity().await;
        if !self.is_mounted() {
            return Err(SubmissionError::Unmounted);
        }
        if lock(&self.shared.state).identity == identity {
            return Ok(false);
        }

        self.shared.stop_autosave().await;
        let next = WizardState::restore(self.shared.store.as_ref(), identity);
        let key = next.key.clone();
        let snapshot = next.snapshot();
        let step_change = {
            let mut state = lock(&self.shared.state);
            let from = state.machine.current();
            *state = next;
            let to = state.machine.current();
            (from != to).then_some((from, to))
        };
        self.shared.snapshots.send_replace(snapshot);
        self.shared.start_autosave(key.clone());
        tracing::info!(key = %key, "identity changed; switched draft namespace");
        if let Some((from, to)) = step_change {
            self.notify(|observer| observer.on_step_change(from, to));
        }
        Ok(true)
    }

    /// Runs `mutate` under the state lock, republishes the snapshot for
    /// autosave and reports a step change, if any.
    fn update<R>(&self, mutate: impl FnOnce(&mut WizardState) -> R) -> R {
        let (result, snapshot, step_change) = {
            let mut state = lock(&self.shared.state);
            let from = state.machine.current();
            let result = mutate(&mut state);
            let to = state.machine.current();
            (result, state.snapshot(), (from != to).then_some((from, to)))
        };
        self.shared.snapshots.send_replace(snapshot);
        if let Some((from, to)) = step_change {
            self.notify(|observer| observer.on_step_change(from, to));
        }
        result
    }

    fn notify(&self, event: impl Fn(&dyn WizardObserver)) {
        if !self.is_mounted() {
            return;
        }
        let observers = lock(&self.shared.observers).clone();
        for observer in observers {
            event(observer.as_ref());
        }
    }

    fn ensure_open(&self) -> Result<(), SubmissionError> {
        if !self.is_mounted() {
            return Err(SubmissionError::Unmounted);
        }
        if self.is_completed() {
            return Err(SubmissionError::AlreadySubmitted);
        }
        Ok(())
    }

    fn begin_call(&self) -> Result<CallGuard<'_>, SubmissionError> {
        self.shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SubmissionError::Busy)?;
        Ok(CallGuard(&self.shared.in_flight))
    }
}
