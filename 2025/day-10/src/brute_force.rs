use bitvec::prelude::*;
use itertools::Itertools;

use crate::error::SolveError;
use crate::limits::Limits;
use crate::machine::{Operation, Row, Solution};

/// Whether the counter search space is small enough to enumerate.
pub fn accepts(target: &[u64], operations: &[Operation], limits: &Limits) -> bool {
    operations.len() <= limits.brute_force_max_operations
        && target.iter().copied().max().unwrap_or(0) <= limits.brute_force_max_target
}

/// A button can't be pressed more often than the smallest target among the counters
/// it touches. A button that touches nothing is never worth pressing.
pub(crate) fn press_bound(op: &Operation, target: &[u64]) -> u64 {
    op.affects(target.len()).map(|i| target[i]).min().unwrap_or(0)
}

/// Tries every press vector within [`press_bound`] and keeps the cheapest exact one.
#[tracing::instrument(level = "debug", skip_all, fields(counters = target.len(), buttons = operations.len()))]
pub fn min_presses(
    target: &[u64],
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    if !accepts(target, operations, limits) {
        return Err(SolveError::SearchBoundExceeded {
            strategy: "brute force",
            limit: limits.brute_force_max_operations as u64,
        });
    }
    if operations.is_empty() {
        return if target.iter().all(|&t| t == 0) {
            Ok(Solution::default())
        } else {
            Err(SolveError::Infeasible)
        };
    }

    let mut best: Option<(u64, Vec<u64>)> = None;
    let mut counters = vec![0u64; target.len()];

    for presses in operations
        .iter()
        .map(|op| 0..=press_bound(op, target))
        .multi_cartesian_product()
    {
        let cost: u64 = presses.iter().sum();
        if best.as_ref().is_some_and(|(b, _)| cost >= *b) {
            continue;
        }

        counters.fill(0);
        for (op, &count) in operations.iter().zip(&presses) {
            for i in op.affects(target.len()) {
                counters[i] += count;
            }
        }
        if counters == target {
            best = Some((cost, presses));
        }
    }

    best.map(|(_, presses)| Solution::new(presses))
        .ok_or(SolveError::Infeasible)
}

/// Tries all `2^B` subsets of buttons.
pub fn min_toggles(
    lights: &BitSlice<usize, Lsb0>,
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    let num_subsets = u32::try_from(operations.len())
        .ok()
        .and_then(|len| 1u64.checked_shl(len))
        .filter(|_| operations.len() <= limits.max_toggle_operations);
    let Some(num_subsets) = num_subsets else {
        return Err(SolveError::SearchBoundExceeded {
            strategy: "exhaustive toggle search",
            limit: limits.max_toggle_operations as u64,
        });
    };

    let masks: Vec<Row> = operations
        .iter()
        .map(|op| {
            let mut row = Row::repeat(false, lights.len());
            for i in op.affects(lights.len()) {
                row.set(i, true);
            }
            row
        })
        .collect();

    let mut best: Option<u64> = None;
    let mut state = Row::repeat(false, lights.len());
    for subset in 0..num_subsets {
        if best.is_some_and(|b| subset.count_ones() >= b.count_ones()) {
            continue;
        }
        state.fill(false);
        for (j, mask) in masks.iter().enumerate() {
            if subset >> j & 1 == 1 {
                state ^= mask;
            }
        }
        if state.as_bitslice() == lights {
            best = Some(subset);
        }
    }

    best.map(|subset| {
        Solution::new(
            (0..operations.len())
                .map(|j| subset >> j & 1)
                .collect(),
        )
    })
    .ok_or(SolveError::Infeasible)
}
