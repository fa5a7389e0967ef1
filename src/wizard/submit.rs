use pubflow_core::{applicable_steps, CommitReport, CommitRequest, Step, WaiverService};
use pubflow_domain::{SubmissionOutcome, WaiverStatus};

use super::{lock, SubmissionWizard, WizardState};
use crate::errors::SubmissionError;

impl SubmissionWizard {
    /// Checks the entered waiver code with the authority without spending
    /// it. An answer that arrives after the code was edited is dropped and
    /// the status stays unchecked.
    ///
    /// A code this draft already spent in a failed commit is not sent again:
    /// the authority would now call it invalid, but it still pays for this
    /// submission.
    pub async fn verify_waiver(&self) -> Result<WaiverStatus, SubmissionError> {
        self.ensure_open()?;
        let _call = self.begin_call()?;
        let code = {
            let mut state = lock(&self.shared.state);
            match state.waiver.begin_check() {
                Some(code) if state.spent(&code) => {
                    state.waiver.resolve(&code, true);
                    tracing::debug!("waiver code already spent on this draft; kept as valid");
                    return Ok(state.waiver.status());
                }
                Some(code) => code,
                None => return Ok(state.waiver.status()),
            }
        };

        let result =
            WaiverService::check(self.shared.collaborators.waivers.as_ref(), &code).await;
        if !self.is_mounted() {
            return Err(SubmissionError::Unmounted);
        }

        let mut state = lock(&self.shared.state);
        match result {
            Ok(valid) => {
                if !state.waiver.resolve(&code, valid) {
                    tracing::debug!("waiver answer arrived for an edited code; ignored");
                }
                Ok(state.waiver.status())
            }
            Err(err) => {
                state.waiver.abandon_check();
                Err(err.into())
            }
        }
    }

    /// Validates every applicable page, then runs the commit sequence. Only
    /// allowed from the payment page, as [`Self::next`] does there.
    ///
    /// A failed commit leaves the draft and the current page untouched and is
    /// returned as `Ok(SubmissionOutcome::Failure)`; call [`Self::retry`] to
    /// run it again. On success the stored draft is deleted and the wizard is
    /// closed.
    pub async fn submit(&self) -> Result<SubmissionOutcome, SubmissionError> {
        self.ensure_open()?;
        let _call = self.begin_call()?;
        let (draft, author, exemption, waiver_already_consumed, publish_immediately) = {
            let state = lock(&self.shared.state);
            let current = state.machine.current();
            if current != Step::LAST {
                return Err(SubmissionError::NotOnPayment { step: current });
            }
            for step in applicable_steps(&state.draft) {
                state
                    .check(step, &self.shared.settings.policy)
                    .map_err(|reason| SubmissionError::Blocked { step, reason })?;
            }
            let exemption = state.exemption();
            let already_consumed = exemption.waiver_code().is_some_and(|code| state.spent(code));
            (
                state.draft.clone(),
                state.identity.clone(),
                exemption,
                already_consumed,
                state.publish_immediately,
            )
        };

        tracing::info!(
            exempt = exemption.is_exempt(),
            academic = draft.is_academic(),
            "submitting publication"
        );
        let report = self
            .shared
            .orchestrator
            .commit(CommitRequest {
                draft: &draft,
                author: author.as_ref(),
                exemption: &exemption,
                publish_immediately,
                waiver_already_consumed,
            })
            .await;
        Ok(self.settle(report).await)
    }

    /// Re-runs a failed submission from the first commit step.
    pub async fn retry(&self) -> Result<SubmissionOutcome, SubmissionError> {
        let failed = matches!(self.last_outcome(), Some(SubmissionOutcome::Failure { .. }));
        if !failed {
            return Err(SubmissionError::NothingToRetry);
        }
        self.submit().await
    }

    async fn settle(&self, report: CommitReport) -> SubmissionOutcome {
        let mounted = self.is_mounted();
        let outcome = report.outcome;
        match &outcome {
            SubmissionOutcome::Success { record_id } => {
                self.shared.stop_autosave().await;
                let key = lock(&self.shared.state).key.clone();
                if let Err(err) = self.shared.store.clear_snapshot(&key) {
                    tracing::warn!(key = %key, error = %err, "could not clear submitted draft");
                }
                if !mounted {
                    tracing::info!(record_id = %record_id, "submission completed after unmount");
                    return outcome;
                }
                let snapshot = {
                    let mut state = lock(&self.shared.state);
                    let identity = state.identity.take();
                    *state = WizardState::fresh(identity);
                    state.completed = true;
                    state.last_outcome = Some(outcome.clone());
                    state.snapshot()
                };
                self.shared.snapshots.send_replace(snapshot);
                self.notify(|observer| observer.on_success(record_id));
            }
            SubmissionOutcome::Failure { reason, .. } => {
                if !mounted {
                    return outcome;
                }
                let snapshot = {
                    let mut state = lock(&self.shared.state);
                    if report.consumed_waiver.is_some() {
                        state.consumed_waiver = report.consumed_waiver;
                    }
                    state.last_outcome = Some(outcome.clone());
                    state.snapshot()
                };
                self.shared.snapshots.send_replace(snapshot);
                self.notify(|observer| observer.on_failure(reason));
            }
        }
        outcome
    }
}
