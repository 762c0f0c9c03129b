use thiserror::Error;

/// Fatal per-component layout failures. A failed component is skipped;
/// remaining components still solve.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The solver terminated without an optimal solution (infeasible,
    /// unbounded, or aborted). No partial coordinates are used.
    #[error("solver terminated without an optimal solution: {0}")]
    SolveFailed(String),

    #[error("crossing elimination did not converge within {0} rounds")]
    RoundLimit(usize),
}
