use pubflow_core::{Step, StepTransition, ValidationError};
use pubflow_domain::SubmissionOutcome;

use super::{lock, SubmissionWizard};
use crate::errors::SubmissionError;

/// Result of [`SubmissionWizard::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { from: Step, to: Step },
    /// `next()` on the payment page ran the commit.
    Submitted(SubmissionOutcome),
    Unchanged,
}

impl SubmissionWizard {
    /// Validator verdict for `step` against the current draft.
    pub fn step_check(&self, step: Step) -> Result<(), ValidationError> {
        lock(&self.shared.state).check(step, &self.shared.settings.policy)
    }

    /// Whether the current page may be left forward.
    pub fn can_advance(&self) -> bool {
        self.step_check(self.current_step()).is_ok()
    }

    /// Leaves the current page forward once its validator passes. On the
    /// payment page this submits instead.
    pub async fn next(&self) -> Result<Advance, SubmissionError> {
        self.ensure_open()?;
        if self.is_busy() {
            return Err(SubmissionError::Busy);
        }
        let policy = &self.shared.settings.policy;
        let transition = self.update(|state| {
            let step = state.machine.current();
            state
                .check(step, policy)
                .map_err(|reason| SubmissionError::Blocked { step, reason })?;
            Ok::<_, SubmissionError>(state.machine.next(&state.draft))
        })?;
        match transition {
            StepTransition::Moved { from, to } => Ok(Advance::Moved { from, to }),
            StepTransition::SubmitRequested => self.submit().await.map(Advance::Submitted),
            _ => Ok(Advance::Unchanged),
        }
    }

    /// Goes back one applicable page. A no-op on the first page.
    pub fn previous(&self) -> Result<StepTransition, SubmissionError> {
        self.ensure_open()?;
        if self.is_busy() {
            return Err(SubmissionError::Busy);
        }
        Ok(self.update(|state| state.machine.previous(&state.draft)))
    }

    pub fn jump_to(&self, target: Step) -> Result<StepTransition, SubmissionError> {
        self.ensure_open()?;
        if self.is_busy() {
            return Err(SubmissionError::Busy);
        }
        match self.update(|state| state.machine.jump_to(target, &state.draft)) {
            StepTransition::Refused { target, reason } => {
                Err(SubmissionError::JumpRefused { target, reason })
            }
            transition => Ok(transition),
        }
    }
}
