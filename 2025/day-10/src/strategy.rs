use crate::brute_force;
use crate::elimination;
use crate::error::SolveError;
use crate::heuristic;
use crate::limits::Limits;
use crate::machine::{Operation, Solution};

/// A way of solving the joltage counter problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Integer elimination with bounded free-variable search. Exact.
    Elimination,
    /// Exhaustive enumeration. Exact, small instances only.
    BruteForce,
    /// Greedy fill and local repair. Exact match, not necessarily minimal.
    Heuristic,
}

impl Strategy {
    /// Exact strategies first, so the heuristic only answers when they ran out of budget.
    pub const ORDER: [Strategy; 3] = [
        Strategy::Elimination,
        Strategy::BruteForce,
        Strategy::Heuristic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Elimination => "elimination",
            Strategy::BruteForce => "brute force",
            Strategy::Heuristic => "heuristic",
        }
    }

    pub fn accepts(self, target: &[u64], operations: &[Operation], limits: &Limits) -> bool {
        match self {
            Strategy::Elimination | Strategy::Heuristic => true,
            Strategy::BruteForce => brute_force::accepts(target, operations, limits),
        }
    }

    pub fn solve(
        self,
        target: &[u64],
        operations: &[Operation],
        limits: &Limits,
    ) -> Result<Solution, SolveError> {
        match self {
            Strategy::Elimination => elimination::solve(target, operations, limits),
            Strategy::BruteForce => brute_force::min_presses(target, operations, limits),
            Strategy::Heuristic => heuristic::solve(target, operations, limits),
        }
    }
}

/// Runs [`Strategy::ORDER`].
pub fn solve_counters(
    target: &[u64],
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    solve_with(&Strategy::ORDER, target, operations, limits)
}

/// Tries `strategies` in order and returns the first verified solution.
///
/// Only [`SolveError::SearchBoundExceeded`] moves on to the next strategy. The other
/// errors are proofs that no solution exists and end the chain.
pub fn solve_with(
    strategies: &[Strategy],
    target: &[u64],
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    let mut last = SolveError::SearchBoundExceeded {
        strategy: "strategy chain",
        limit: strategies.len() as u64,
    };

    for &strategy in strategies {
        if !strategy.accepts(target, operations, limits) {
            tracing::debug!(strategy = strategy.name(), "instance too large, skipping");
            continue;
        }
        match strategy.solve(target, operations, limits) {
            Ok(solution) if solution.reproduces_counters(operations, target) => {
                tracing::trace!(strategy = strategy.name(), cost = solution.cost(), "solved");
                return Ok(solution);
            }
            Ok(solution) => {
                tracing::warn!(
                    strategy = strategy.name(),
                    presses = ?solution.presses(),
                    "discarding a solution that misses the target"
                );
                last = SolveError::SearchBoundExceeded {
                    strategy: strategy.name(),
                    limit: 0,
                };
            }
            Err(error) if error.is_budget() => {
                tracing::debug!(strategy = strategy.name(), %error, "falling through");
                last = error;
            }
            Err(error) => return Err(error),
        }
    }

    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(sets: &[Vec<usize>]) -> Vec<Operation> {
        sets.iter().map(|s| Operation::new(s.iter().copied())).collect()
    }

    #[test]
    fn default_chain_is_exact() -> miette::Result<()> {
        let operations = ops(&[vec![3], vec![1, 3], vec![2], vec![2, 3], vec![0, 2], vec![0, 1]]);
        let solution = solve_counters(&[3, 5, 4, 7], &operations, &Limits::default())?;
        assert_eq!(10, solution.cost());
        Ok(())
    }

    #[test]
    fn falls_through_to_brute_force_when_elimination_runs_out() -> miette::Result<()> {
        let operations = ops(&[vec![3], vec![1, 3], vec![2], vec![2, 3], vec![0, 2], vec![0, 1]]);
        let limits = Limits {
            max_search_nodes: 1,
            ..Limits::default()
        };
        assert!(elimination::solve(&[3, 5, 4, 7], &operations, &limits).is_err());

        let solution = solve_counters(&[3, 5, 4, 7], &operations, &limits)?;
        assert_eq!(10, solution.cost());
        Ok(())
    }

    #[test]
    fn falls_through_to_the_heuristic_last() -> miette::Result<()> {
        let operations = ops(&[vec![0], vec![1], vec![0, 1]]);
        let limits = Limits {
            max_search_nodes: 1,
            brute_force_max_operations: 0,
            ..Limits::default()
        };
        assert!(!Strategy::BruteForce.accepts(&[2, 2], &operations, &limits));

        let solution = solve_counters(&[2, 2], &operations, &limits)?;
        assert_eq!(2, solution.cost());
        assert!(solution.reproduces_counters(&operations, &[2, 2]));
        Ok(())
    }

    #[test]
    fn proofs_of_impossibility_end_the_chain() {
        let operations = ops(&[vec![0, 1]]);
        let result = solve_counters(&[1, 2], &operations, &Limits::default());
        assert!(matches!(result, Err(SolveError::Inconsistent { .. })));

        let result = solve_counters(&[0, 1], &ops(&[vec![0], vec![0, 1]]), &Limits::default());
        assert_eq!(Err(SolveError::Infeasible), result);
    }

    #[test]
    fn exhausted_chain_reports_the_last_budget() {
        let operations = ops(&[vec![0], vec![0, 1]]);
        let limits = Limits {
            max_search_nodes: 0,
            ..Limits::default()
        };
        let result = solve_with(
            &[Strategy::Elimination, Strategy::Heuristic],
            &[0, 1],
            &operations,
            &limits,
        );
        assert!(matches!(
            result,
            Err(SolveError::SearchBoundExceeded {
                strategy: "greedy search with local repair",
                ..
            })
        ));
        assert!(solve_with(&[], &[0], &operations, &limits).is_err());
    }
}
