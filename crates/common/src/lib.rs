//! shotdiff Common Library
//!
//! The report data model shared by the diff runner and the CLI, the
//! pull-request check status derived from it, and the collaborator error type.

pub mod error;
pub mod status;
pub mod types;

pub use error::{Error, Result};
pub use status::{CheckState, CheckStatus};
pub use types::*;

/// shotdiff version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default stable reference branch that pull requests are compared against
pub const DEFAULT_STABLE_BRANCH: &str = "origin/master";
