use bitvec::prelude::*;

use crate::error::SolveError;
use crate::limits::Limits;
use crate::machine::{Operation, Row, Solution};

struct ToggleSystem {
    /// Augmented matrix [A | b] in Reduced Row Echelon Form
    matrix: Vec<Row>,
    num_vars: usize,
    num_eqs: usize,
    /// Maps column index (variable) to pivot row index
    col_to_pivot: Vec<Option<usize>>,
    /// Indices of free variables (columns without pivots)
    free_vars: Vec<usize>,
}

impl ToggleSystem {
    fn new(lights: &BitSlice<usize, Lsb0>, operations: &[Operation]) -> Self {
        let num_eqs = lights.len();
        let num_vars = operations.len();

        // One row per light, one column per button plus the target column.
        let mut matrix = vec![Row::repeat(false, num_vars + 1); num_eqs];
        for (c, op) in operations.iter().enumerate() {
            for r in op.affects(num_eqs) {
                matrix[r].set(c, true);
            }
        }
        for r in lights.iter_ones() {
            matrix[r].set(num_vars, true);
        }

        Self {
            matrix,
            num_vars,
            num_eqs,
            col_to_pivot: vec![None; num_vars],
            free_vars: Vec::new(),
        }
    }

    /// Performs Gaussian Elimination to transform the matrix into Reduced Row Echelon Form (RREF).
    fn rref(&mut self) -> Result<(), SolveError> {
        let mut pivot_row = 0;

        for c in 0..self.num_vars {
            if pivot_row >= self.num_eqs {
                self.free_vars.push(c);
                continue;
            }

            let Some(r) = (pivot_row..self.num_eqs).find(|&r| self.matrix[r][c]) else {
                self.free_vars.push(c);
                continue;
            };

            self.matrix.swap(pivot_row, r);
            self.col_to_pivot[c] = Some(pivot_row);

            let pivot_vec = self.matrix[pivot_row].clone();
            for (i, row) in self.matrix.iter_mut().enumerate() {
                if i != pivot_row && row[c] {
                    *row ^= &pivot_vec;
                }
            }
            pivot_row += 1;
        }

        // Every row past the last pivot reads 0 = b_r.
        match (pivot_row..self.num_eqs).find(|&r| self.matrix[r][self.num_vars]) {
            Some(row) => Err(SolveError::Inconsistent { row, residual: 1 }),
            None => Ok(()),
        }
    }

    /// Solution with every free variable set to 0: pivots read the target column.
    fn particular(&self) -> Row {
        let mut x = Row::repeat(false, self.num_vars);
        for (c, pivot) in self.col_to_pivot.iter().enumerate() {
            if let Some(r) = *pivot {
                x.set(c, self.matrix[r][self.num_vars]);
            }
        }
        x
    }

    /// One null-space vector per free variable `f`: `x_f = 1`, other free variables 0.
    /// In RREF a pivot row only mentions its pivot and free columns, so each pivot
    /// variable is just the row's entry in column `f`.
    fn null_basis(&self) -> Vec<Row> {
        self.free_vars
            .iter()
            .map(|&f| {
                let mut v = Row::repeat(false, self.num_vars);
                v.set(f, true);
                for (c, pivot) in self.col_to_pivot.iter().enumerate() {
                    if let Some(r) = *pivot {
                        v.set(c, self.matrix[r][f]);
                    }
                }
                v
            })
            .collect()
    }

    /// Walks the affine solution space in Gray-code order, one XOR per step.
    fn min_weight(mut self, limits: &Limits) -> Result<Row, SolveError> {
        self.rref()?;

        let k = self.free_vars.len();
        let num_combinations = u32::try_from(k)
            .ok()
            .and_then(|k| 1usize.checked_shl(k))
            .filter(|_| k <= limits.max_free_toggles);
        let Some(num_combinations) = num_combinations else {
            return Err(SolveError::SearchBoundExceeded {
                strategy: "GF(2) null-space enumeration",
                limit: limits.max_free_toggles as u64,
            });
        };
        tracing::debug!(
            rank = self.num_vars - k,
            free = k,
            "reduced toggle system"
        );

        let null_basis = self.null_basis();
        let mut current = self.particular();
        let mut best = current.clone();
        let mut best_weight = current.count_ones();

        // The bit that changes between gray(i-1) and gray(i) is the lowest set bit of i.
        for i in 1..num_combinations {
            current ^= &null_basis[i.trailing_zeros() as usize];
            let weight = current.count_ones();
            if weight < best_weight {
                best_weight = weight;
                best.clone_from(&current);
            }
        }

        Ok(best)
    }
}

/// Fewest button presses (each button at most once) that light exactly `lights`.
#[tracing::instrument(level = "debug", skip_all, fields(lights = lights.len(), buttons = operations.len()))]
pub fn solve(
    lights: &BitSlice<usize, Lsb0>,
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    let best = ToggleSystem::new(lights, operations).min_weight(limits)?;
    Ok(Solution::from_toggles(&best))
}
