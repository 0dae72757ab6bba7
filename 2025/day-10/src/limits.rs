/// Caps on every enumeration the solvers perform.
///
/// Every search in this crate is exponential in some instance parameter, so each
/// one checks a field of this struct and reports
/// [`SolveError::SearchBoundExceeded`](crate::error::SolveError::SearchBoundExceeded)
/// instead of running unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of free variables in the GF(2) system (`2^n` candidates).
    pub max_free_toggles: usize,
    /// Maximum number of buttons for the exhaustive `2^B` toggle search.
    pub max_toggle_operations: usize,
    /// Maximum number of nodes visited by the free-variable enumeration of the
    /// integer solver.
    pub max_search_nodes: u64,
    /// Brute force only runs with at most this many buttons...
    pub brute_force_max_operations: usize,
    /// ...and when no counter target exceeds this value.
    pub brute_force_max_target: u64,
    /// Greedy fill stops after `factor * sum(target)` presses.
    pub greedy_iteration_factor: u64,
    /// Maximum number of accepted swaps during local repair.
    pub max_repair_iterations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_free_toggles: 24,
            max_toggle_operations: 20,
            max_search_nodes: 20_000_000,
            brute_force_max_operations: 6,
            brute_force_max_target: 15,
            greedy_iteration_factor: 2,
            max_repair_iterations: 100,
        }
    }
}
