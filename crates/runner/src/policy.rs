//! Branch policy

/// Whether `diff_base` denotes the stable reference branch.
///
/// The stable branch is never diffed against itself, so a run on it ends after
/// the primary pass.
pub fn is_stable_reference_branch(diff_base: &str, stable_branch: &str) -> bool {
    !stable_branch.is_empty() && diff_base.starts_with(stable_branch)
}
