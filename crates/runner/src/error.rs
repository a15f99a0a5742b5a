//! Runner-local error type: almost everything the `TaskRunner` surfaces is
//! a capacity/not-found condition at the scheduling boundary, not a
//! pipeline failure (those are folded into the `Task` record itself).

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("task runner at capacity")]
    AtCapacity,

    #[error("task {0} is not tracked by this runner")]
    NotTracked(Uuid),

    #[error(transparent)]
    Core(#[from] podcast_core::Error),
}

impl From<RunnerError> for podcast_core::Error {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::AtCapacity => podcast_core::Error::AtCapacity,
            RunnerError::NotTracked(id) => podcast_core::Error::NotFound(id),
            RunnerError::Core(e) => e,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
