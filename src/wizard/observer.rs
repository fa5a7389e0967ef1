use pubflow_core::Step;
use pubflow_domain::RecordId;

/// Callbacks fired by a mounted wizard. Nothing is delivered after the
/// wizard's [`MountHandle`](super::MountHandle) has been released, including
/// completions of calls that were already in flight.
pub trait WizardObserver: Send + Sync {
    fn on_step_change(&self, _from: Step, _to: Step) {}

    fn on_success(&self, _record_id: &RecordId) {}

    /// `reason` is the message to show next to the retry action.
    fn on_failure(&self, _reason: &str) {}
}
