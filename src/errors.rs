use pubflow_config::ConfigError;
use pubflow_core::{CoreError, JumpRefusal, Step, ValidationError};
use thiserror::Error;

/// Error type surfaced by the wizard facade and the CLI.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Step {step} is incomplete: {reason}")]
    Blocked { step: Step, reason: ValidationError },
    #[error("Cannot open step {target}: {reason}")]
    JumpRefused { target: Step, reason: JumpRefusal },
    #[error("Submitting is only possible from the payment step, not step {step}")]
    NotOnPayment { step: Step },
    #[error("A request for this step is already in progress")]
    Busy,
    #[error("The submission form is no longer open")]
    Unmounted,
    #[error("This submission has already been published")]
    AlreadySubmitted,
    #[error("There is no failed submission to retry")]
    NothingToRetry,
}
