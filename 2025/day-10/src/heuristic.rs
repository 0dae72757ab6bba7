use crate::error::SolveError;
use crate::limits::Limits;
use crate::machine::{Operation, Solution};

struct State<'a> {
    target: Vec<i64>,
    operations: &'a [Operation],
    presses: Vec<u64>,
    counters: Vec<i64>,
}

impl<'a> State<'a> {
    /// Fails when the targets don't fit the signed counters together.
    fn new(target: &[u64], operations: &'a [Operation]) -> Result<Self, SolveError> {
        let out_of_range = SolveError::SearchBoundExceeded {
            strategy: "greedy search with local repair",
            limit: i64::MAX as u64,
        };
        let target: Vec<i64> = target
            .iter()
            .map(|&t| i64::try_from(t))
            .collect::<Result<_, _>>()
            .map_err(|_| out_of_range.clone())?;
        if target.iter().try_fold(0i64, |sum, &t| sum.checked_add(t)).is_none() {
            return Err(out_of_range);
        }

        Ok(Self {
            counters: vec![0; target.len()],
            target,
            operations,
            presses: vec![0; operations.len()],
        })
    }

    fn press(&mut self, button: usize, times: i64) {
        for i in self.operations[button].affects(self.counters.len()) {
            self.counters[i] += times;
        }
        self.presses[button] = self.presses[button].saturating_add_signed(times);
    }

    fn is_solved(&self) -> bool {
        self.counters == self.target
    }

    /// Total absolute deviation from the target.
    fn distance(&self) -> i64 {
        self.counters
            .iter()
            .zip(&self.target)
            .map(|(c, t)| (c - t).abs())
            .sum()
    }

    /// A counter touched by a single button pins that button's press count.
    fn apply_forced(&mut self) -> Result<(), SolveError> {
        let dimension = self.counters.len();
        let mut forced: Vec<Option<i64>> = vec![None; self.operations.len()];

        for (i, &t) in self.target.iter().enumerate() {
            let mut touching = self
                .operations
                .iter()
                .enumerate()
                .filter(|(_, op)| op.affects(dimension).any(|k| k == i))
                .map(|(j, _)| j);
            let (Some(j), None) = (touching.next(), touching.next()) else {
                continue;
            };
            match forced[j] {
                Some(previous) if previous != t => return Err(SolveError::Infeasible),
                _ => forced[j] = Some(t),
            }
        }

        for (j, times) in forced.into_iter().enumerate() {
            if let Some(times) = times {
                self.press(j, times);
            }
        }
        tracing::trace!(presses = ?self.presses, "applied forced presses");
        Ok(())
    }

    /// Helped counters count double, overshot counters count once against.
    fn score(&self, button: usize) -> i64 {
        self.operations[button]
            .affects(self.counters.len())
            .map(|i| if self.counters[i] < self.target[i] { 2 } else { -1 })
            .sum()
    }

    fn greedy_fill(&mut self, max_presses: u64) {
        for _ in 0..max_presses {
            if self.is_solved() {
                return;
            }
            let mut best: Option<(usize, i64)> = None;
            for j in 0..self.operations.len() {
                let score = self.score(j);
                if score > 0 && best.map_or(true, |(_, s)| score > s) {
                    best = Some((j, score));
                }
            }
            let Some((j, _)) = best else {
                return;
            };
            self.press(j, 1);
        }
    }

    /// Moves one press from one button to another while that strictly lowers the
    /// distance to the target.
    fn repair(&mut self, max_swaps: usize) {
        let mut distance = self.distance();
        for _ in 0..max_swaps {
            if distance == 0 {
                return;
            }
            let Some((from, to, improved)) = self.first_improving_swap(distance) else {
                return;
            };
            self.press(from, -1);
            self.press(to, 1);
            distance = improved;
        }
    }

    /// First swap (in button order) that lowers the distance below `distance`.
    fn first_improving_swap(&mut self, distance: i64) -> Option<(usize, usize, i64)> {
        let n = self.operations.len();
        for from in 0..n {
            if self.presses[from] == 0 {
                continue;
            }
            for to in 0..n {
                if to == from {
                    continue;
                }
                self.press(from, -1);
                self.press(to, 1);
                let candidate = self.distance();
                self.press(to, -1);
                self.press(from, 1);
                if candidate < distance {
                    return Some((from, to, candidate));
                }
            }
        }
        None
    }
}

/// Produces an exact, not necessarily minimal, solution.
#[tracing::instrument(level = "debug", skip_all, fields(counters = target.len(), buttons = operations.len()))]
pub fn solve(
    target: &[u64],
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    let mut state = State::new(target, operations)?;
    state.apply_forced()?;

    let total: u64 = target.iter().sum();
    state.greedy_fill(limits.greedy_iteration_factor.saturating_mul(total));
    if !state.is_solved() {
        tracing::debug!(distance = state.distance(), "greedy fill missed, repairing");
        state.repair(limits.max_repair_iterations);
    }

    let solution = Solution::new(state.presses);
    if solution.reproduces_counters(operations, target) {
        Ok(solution)
    } else {
        Err(SolveError::SearchBoundExceeded {
            strategy: "greedy search with local repair",
            limit: limits.max_repair_iterations as u64,
        })
    }
}
