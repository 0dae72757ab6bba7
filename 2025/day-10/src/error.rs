use miette::Diagnostic;
use thiserror::Error;

/// Why a single machine could not be configured.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SolveError {
    /// Elimination reduced a row to `0 = r` with `r != 0`.
    #[error("the button equations are inconsistent (row {row} reduces to 0 = {residual})")]
    #[diagnostic(code(factory::inconsistent))]
    Inconsistent { row: usize, residual: i128 },

    /// The system has rational solutions but none in non-negative integers.
    #[error("no non-negative integer press counts reach the target")]
    #[diagnostic(code(factory::infeasible))]
    Infeasible,

    #[error("the machine has no joltage requirements")]
    #[diagnostic(code(factory::missing_joltages), help("add a `{{...}}` block to the line"))]
    MissingJoltages,

    #[error("{strategy} gave up after exhausting its budget of {limit}")]
    #[diagnostic(
        code(factory::search_bound_exceeded),
        help("raise the corresponding field of `Limits` to search further")
    )]
    SearchBoundExceeded { strategy: &'static str, limit: u64 },
}

impl SolveError {
    /// True when the failure only says "not found within the budget", as opposed
    /// to a proof that no solution exists.
    pub fn is_budget(&self) -> bool {
        matches!(self, SolveError::SearchBoundExceeded { .. })
    }
}

/// A batch failed because one of its machines did.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("machine {} could not be configured", .machine + 1)]
#[diagnostic(code(factory::batch))]
pub struct BatchError {
    /// Zero-based position of the machine in the input.
    pub machine: usize,
    #[source]
    #[diagnostic_source]
    pub source: SolveError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("failed to parse machine specifications: {}", .messages.join("; "))]
#[diagnostic(code(factory::parse))]
pub struct ParseError {
    pub messages: Vec<String>,
}
