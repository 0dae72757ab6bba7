use num_integer::Integer;

use crate::error::SolveError;
use crate::limits::Limits;
use crate::machine::{Operation, Solution};

struct CounterSystem {
    /// Augmented matrix [A | b], one row per counter
    matrix: Vec<Vec<i128>>,
    num_vars: usize,
    num_eqs: usize,
    /// (row, column) of every pivot, in column order
    pivots: Vec<(usize, usize)>,
    free_vars: Vec<usize>,
}

/// Divides a row by the gcd of its entries.
fn normalize(row: &mut [i128]) {
    let g = row.iter().fold(0i128, |g, v| g.gcd(v));
    if g > 1 {
        row.iter_mut().for_each(|v| *v /= g);
    }
}

impl CounterSystem {
    fn new(target: &[u64], operations: &[Operation]) -> Self {
        let num_eqs = target.len();
        let num_vars = operations.len();

        let mut matrix = vec![vec![0i128; num_vars + 1]; num_eqs];
        for (c, op) in operations.iter().enumerate() {
            for r in op.affects(num_eqs) {
                matrix[r][c] = 1;
            }
        }
        for (row, &t) in matrix.iter_mut().zip(target) {
            row[num_vars] = i128::from(t);
        }

        Self {
            matrix,
            num_vars,
            num_eqs,
            pivots: Vec::new(),
            free_vars: Vec::new(),
        }
    }

    fn reduce(&mut self) -> Result<(), SolveError> {
        let mut pivot_row = 0;

        for c in 0..self.num_vars {
            if pivot_row >= self.num_eqs {
                self.free_vars.push(c);
                continue;
            }

            let Some(r) = (pivot_row..self.num_eqs).find(|&r| self.matrix[r][c] != 0) else {
                self.free_vars.push(c);
                continue;
            };

            self.matrix.swap(pivot_row, r);
            if self.matrix[pivot_row][c] < 0 {
                self.matrix[pivot_row].iter_mut().for_each(|v| *v = -*v);
            }

            // R <- p * R - R[c] * pivot keeps everything integral; p > 0 keeps the
            // sign of earlier pivots.
            let pivot = self.matrix[pivot_row].clone();
            let p = pivot[c];
            for (i, row) in self.matrix.iter_mut().enumerate() {
                let factor = row[c];
                if i == pivot_row || factor == 0 {
                    continue;
                }
                for (v, &pv) in row.iter_mut().zip(&pivot) {
                    *v = *v * p - pv * factor;
                }
                normalize(row);
            }

            self.pivots.push((pivot_row, c));
            pivot_row += 1;
        }

        for r in pivot_row..self.num_eqs {
            let residual = self.matrix[r][self.num_vars];
            if residual != 0 {
                return Err(SolveError::Inconsistent { row: r, residual });
            }
        }
        Ok(())
    }
}

/// Depth-first branch-and-bound over the free variables.
struct Search<'a> {
    system: &'a CounterSystem,
    /// In-range counters touched by each free variable's button
    touched: Vec<Vec<usize>>,
    /// Pivot rows that become fully determined once `depth` free variables are set
    ready: Vec<Vec<(usize, usize)>>,
    /// Target minus the contribution of the free variables assigned so far
    residual: Vec<i128>,
    values: Vec<u64>,
    best: Option<(u64, Vec<u64>)>,
    nodes: u64,
    max_nodes: u64,
}

impl<'a> Search<'a> {
    fn new(
        system: &'a CounterSystem,
        target: &[u64],
        operations: &[Operation],
        limits: &Limits,
    ) -> Self {
        let touched = system
            .free_vars
            .iter()
            .map(|&f| operations[f].affects(target.len()).collect())
            .collect();

        let mut ready = vec![Vec::new(); system.free_vars.len() + 1];
        for &(row, col) in &system.pivots {
            let depth = system
                .free_vars
                .iter()
                .rposition(|&f| system.matrix[row][f] != 0)
                .map_or(0, |d| d + 1);
            ready[depth].push((row, col));
        }

        Self {
            system,
            touched,
            ready,
            residual: target.iter().map(|&t| i128::from(t)).collect(),
            values: vec![0; system.num_vars],
            best: None,
            nodes: 0,
            max_nodes: limits.max_search_nodes,
        }
    }

    fn is_pruned(&self, cost: u64) -> bool {
        self.best.as_ref().is_some_and(|(best, _)| cost >= *best)
    }

    /// Back-substitutes one pivot: the division must be exact and the result non-negative.
    fn pivot_value(&self, row: usize, col: usize) -> Option<u64> {
        let line = &self.system.matrix[row];
        let rest: i128 = self
            .system
            .free_vars
            .iter()
            .filter(|&&f| line[f] != 0)
            .map(|&f| line[f] * i128::from(self.values[f]))
            .sum();
        let (value, remainder) = (line[self.system.num_vars] - rest).div_rem(&line[col]);
        if remainder != 0 || value < 0 {
            return None;
        }
        u64::try_from(value).ok()
    }

    fn descend(&mut self, depth: usize, mut partial: u64) -> Result<(), SolveError> {
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Err(SolveError::SearchBoundExceeded {
                strategy: "free-variable enumeration",
                limit: self.max_nodes,
            });
        }

        for i in 0..self.ready[depth].len() {
            let (row, col) = self.ready[depth][i];
            let Some(value) = self.pivot_value(row, col) else {
                return Ok(());
            };
            self.values[col] = value;
            partial += value;
        }
        if self.is_pruned(partial) {
            return Ok(());
        }

        let Some(&col) = self.system.free_vars.get(depth) else {
            self.best = Some((partial, self.values.clone()));
            return Ok(());
        };

        let upper = self.touched[depth]
            .iter()
            .map(|&i| self.residual[i])
            .min()
            .unwrap_or(0);

        // The residuals are left dirty if the budget runs out; the search is over then.
        let mut applied = 0;
        for value in 0..=upper {
            if value > 0 {
                for &i in &self.touched[depth] {
                    self.residual[i] -= 1;
                }
                applied = value;
            }
            let cost = partial + value as u64;
            if self.is_pruned(cost) {
                break;
            }
            self.values[col] = value as u64;
            self.descend(depth + 1, cost)?;
        }
        for &i in &self.touched[depth] {
            self.residual[i] += applied;
        }
        self.values[col] = 0;

        Ok(())
    }
}

/// Fewest total presses whose counters equal `target` exactly.
#[tracing::instrument(level = "debug", skip_all, fields(counters = target.len(), buttons = operations.len()))]
pub fn solve(
    target: &[u64],
    operations: &[Operation],
    limits: &Limits,
) -> Result<Solution, SolveError> {
    let mut system = CounterSystem::new(target, operations);
    system.reduce()?;
    tracing::debug!(
        rank = system.pivots.len(),
        free = system.free_vars.len(),
        "reduced counter system"
    );

    let mut search = Search::new(&system, target, operations, limits);
    search.descend(0, 0)?;
    tracing::trace!(nodes = search.nodes, "free-variable search finished");

    search
        .best
        .map(|(_, presses)| Solution::new(presses))
        .ok_or(SolveError::Infeasible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brute_force;
    use itertools::Itertools;
    use rstest::rstest;

    fn ops(sets: &[Vec<usize>]) -> Vec<Operation> {
        sets.iter().map(|s| Operation::new(s.iter().copied())).collect()
    }

    #[rstest]
    #[case(vec![3, 5, 4, 7], vec![vec![3], vec![1, 3], vec![2], vec![2, 3], vec![0, 2], vec![0, 1]], 10)]
    #[case(vec![7, 5, 12, 7, 2], vec![vec![0, 2, 3, 4], vec![2, 3], vec![0, 4], vec![0, 1, 2], vec![1, 2, 3, 4]], 12)]
    #[case(vec![10, 11, 11, 5, 10, 5], vec![vec![0, 1, 2, 3, 4], vec![0, 3, 4], vec![0, 1, 2, 4, 5], vec![1, 2]], 11)]
    #[case(vec![], vec![], 0)]
    #[case(vec![0, 0, 0], vec![], 0)]
    #[case(vec![2], vec![vec![0], vec![9]], 2)]
    #[case(vec![200, 150], vec![vec![0], vec![0, 1], vec![1]], 200)]
    fn finds_minimum_presses(
        #[case] target: Vec<u64>,
        #[case] buttons: Vec<Vec<usize>>,
        #[case] expected: u64,
    ) -> miette::Result<()> {
        let operations = ops(&buttons);
        let solution = solve(&target, &operations, &Limits::default())?;
        assert_eq!(expected, solution.cost());
        assert!(solution.reproduces_counters(&operations, &target));
        Ok(())
    }

    #[rstest]
    #[case(vec![1, 2], vec![vec![0, 1]])]
    #[case(vec![4], vec![])]
    fn reports_inconsistent_systems(#[case] target: Vec<u64>, #[case] buttons: Vec<Vec<usize>>) {
        let result = solve(&target, &ops(&buttons), &Limits::default());
        assert!(matches!(result, Err(SolveError::Inconsistent { .. })), "{result:?}");
    }

    #[rstest]
    // Only rational: every button pressed half a time.
    #[case(vec![1, 1, 1], vec![vec![0, 1], vec![1, 2], vec![0, 2]])]
    // Only with a negative press count.
    #[case(vec![0, 1], vec![vec![0], vec![0, 1]])]
    fn reports_infeasible_systems(#[case] target: Vec<u64>, #[case] buttons: Vec<Vec<usize>>) {
        assert_eq!(
            Err(SolveError::Infeasible),
            solve(&target, &ops(&buttons), &Limits::default())
        );
    }

    #[test]
    fn search_budget_is_enforced() {
        let operations = ops(&[vec![3], vec![1, 3], vec![2], vec![2, 3], vec![0, 2], vec![0, 1]]);
        let limits = Limits {
            max_search_nodes: 1,
            ..Limits::default()
        };
        let result = solve(&[3, 5, 4, 7], &operations, &limits);
        assert_eq!(
            Err(SolveError::SearchBoundExceeded {
                strategy: "free-variable enumeration",
                limit: 1,
            }),
            result
        );
    }

    /// Every choice of two to four distinct buttons over three counters, for every
    /// target with entries up to 3.
    #[test]
    fn agrees_with_brute_force() -> miette::Result<()> {
        let limits = Limits::default();
        let subsets: Vec<Vec<usize>> = (1..8usize)
            .map(|mask| (0..3).filter(|i| mask >> i & 1 == 1).collect())
            .collect();
        let targets: Vec<Vec<u64>> = (0..3).map(|_| 0..=3u64).multi_cartesian_product().collect();

        for size in 2..=4 {
            for chosen in subsets.iter().combinations(size) {
                let operations: Vec<Operation> =
                    chosen.iter().map(|s| Operation::new(s.iter().copied())).collect();
                for target in &targets {
                    let expected = brute_force::min_presses(target, &operations, &limits);
                    let actual = solve(target, &operations, &limits);
                    match (expected, actual) {
                        (Ok(e), Ok(a)) => {
                            assert_eq!(e.cost(), a.cost(), "{operations:?} -> {target:?}");
                            assert!(a.reproduces_counters(&operations, target));
                        }
                        (Err(SolveError::Infeasible), Err(SolveError::Infeasible))
                        | (Err(SolveError::Infeasible), Err(SolveError::Inconsistent { .. })) => {}
                        (e, a) => panic!(
                            "{operations:?} -> {target:?}: brute force {e:?}, elimination {a:?}"
                        ),
                    }
                }
            }
        }
        Ok(())
    }
}
