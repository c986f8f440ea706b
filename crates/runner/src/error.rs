//! Error types for a diff run

use thiserror::Error;

/// Errors that end a run
#[derive(Error, Debug)]
pub enum RunError {
    /// The project build failed; surfaced unchanged since it is not a diff failure
    #[error(transparent)]
    Build(shotdiff_common::Error),

    #[error("failed to run screenshot tests against {diff_base}")]
    Pass {
        diff_base: String,
        #[source]
        source: shotdiff_common::Error,
    },

    #[error("failed to publish pull request status")]
    Status(#[source] shotdiff_common::Error),
}

pub type RunResult<T> = Result<T, RunError>;
