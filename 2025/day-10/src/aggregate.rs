use rayon::prelude::*;

use crate::error::{BatchError, SolveError};
use crate::gf2;
use crate::limits::Limits;
use crate::machine::{Machine, Solution};
use crate::strategy;

/// Which target of a machine to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    /// Toggle the indicator lights (part one).
    Lights,
    /// Raise the joltage counters (part two).
    Joltage,
}

/// Solves machines one by one and adds up their costs.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    limits: Limits,
    parallel: bool,
}

impl Aggregator {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            parallel: false,
        }
    }

    /// Solve machines on the rayon thread pool. The total is the same; when several
    /// machines fail, the reported one is not necessarily the first.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn solve_machine(&self, machine: &Machine, problem: Problem) -> Result<Solution, SolveError> {
        match problem {
            Problem::Lights => gf2::solve(&machine.lights, &machine.operations, &self.limits),
            Problem::Joltage => {
                let target = machine
                    .joltages
                    .as_deref()
                    .ok_or(SolveError::MissingJoltages)?;
                strategy::solve_counters(target, &machine.operations, &self.limits)
            }
        }
    }

    fn cost(&self, index: usize, machine: &Machine, problem: Problem) -> Result<u64, BatchError> {
        let solution = self
            .solve_machine(machine, problem)
            .map_err(|source| BatchError {
                machine: index,
                source,
            })?;
        tracing::trace!(machine = index, cost = solution.cost(), "machine configured");
        Ok(solution.cost())
    }

    /// Sum of the minimum costs of every machine, or the first failure.
    #[tracing::instrument(level = "debug", skip_all, fields(machines = machines.len(), problem = ?problem))]
    pub fn total(&self, machines: &[Machine], problem: Problem) -> Result<u64, BatchError> {
        if self.parallel {
            machines
                .par_iter()
                .enumerate()
                .map(|(index, machine)| self.cost(index, machine, problem))
                .try_reduce(|| 0, |a, b| Ok(a + b))
        } else {
            machines
                .iter()
                .enumerate()
                .try_fold(0, |total, (index, machine)| {
                    Ok(total + self.cost(index, machine, problem)?)
                })
        }
    }
}

/// The `-1` convention for reporting a failed batch as a plain number. A total too
/// large for `i64` is reported as a failure too.
pub fn sentinel(result: &Result<u64, BatchError>) -> i64 {
    match result {
        Ok(total) => i64::try_from(*total).unwrap_or(-1),
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::parse;
    use rstest::rstest;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    #[rstest]
    #[case(Problem::Lights, 7)]
    #[case(Problem::Joltage, 33)]
    fn total_is_the_sum_of_machine_minimums(
        #[case] problem: Problem,
        #[case] expected: u64,
    ) -> miette::Result<()> {
        let machines = parse(EXAMPLE)?;
        let aggregator = Aggregator::default();

        let mut sum = 0;
        for machine in &machines {
            sum += aggregator.solve_machine(machine, problem)?.cost();
        }
        assert_eq!(expected, sum);
        assert_eq!(expected, aggregator.total(&machines, problem)?);
        assert_eq!(
            expected,
            aggregator.clone().parallel(true).total(&machines, problem)?
        );
        Ok(())
    }

    #[test]
    fn first_failure_fails_the_batch() -> miette::Result<()> {
        let machines = parse("[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1)\n[#.] (1)\n[..] (0)")?;
        let result = Aggregator::default().total(&machines, Problem::Lights);

        let error = result.clone().unwrap_err();
        assert_eq!(1, error.machine);
        assert!(matches!(error.source, SolveError::Inconsistent { .. }));
        assert_eq!(-1, sentinel(&result));
        Ok(())
    }

    #[test]
    fn joltage_needs_a_target() -> miette::Result<()> {
        let machines = parse("[#] (0) {1}\n[#] (0)")?;
        let result = Aggregator::default().total(&machines, Problem::Joltage);
        assert_eq!(
            Err(BatchError {
                machine: 1,
                source: SolveError::MissingJoltages,
            }),
            result
        );
        Ok(())
    }

    #[test]
    fn empty_batches_cost_nothing() {
        let result = Aggregator::default().total(&[], Problem::Joltage);
        assert_eq!(Ok(0), result);
        assert_eq!(0, sentinel(&result));
    }
}
