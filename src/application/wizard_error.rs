use thiserror::Error;

use crate::domain::FieldErrors;
use crate::infrastructure::SyncError;

/// Why a wizard operation was refused. None of these are fatal; the session
/// is left consistent and the operation may be retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WizardError {
    #[error("Please fix the highlighted fields")]
    Validation(#[from] FieldErrors),
    #[error("{reason}")]
    Unaffordable { reason: String, max_loan: f64 },
    #[error("Could not save step data: {0}")]
    Sync(#[from] SyncError),
    #[error("Please confirm that all data is correct")]
    ConfirmationMissing,
    #[error("Still saving the previous step, please wait")]
    Busy,
    #[error("The application was restarted before the step was saved")]
    Stale,
    #[error("Data for step {submitted} cannot complete step {active}")]
    WrongStep { active: usize, submitted: usize },
    #[error("Already at the first step")]
    AtFirstStep,
    #[error("The application is not ready for submission yet")]
    NotAtReview,
    #[error("The application has already been submitted")]
    AlreadySubmitted,
    #[error("No remote record exists for this application")]
    MissingRecordId,
}
