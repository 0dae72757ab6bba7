use bitvec::prelude::*;
use chumsky::prelude::*;

use crate::error::ParseError;

/// A bit vector backed by `usize` words with Least Significant Bit first ordering.
/// This aligns with standard CPU integer operations for maximum performance.
pub type Row = BitVec<usize, Lsb0>;

/// A button: the set of light/counter indices it affects.
///
/// Indices are kept sorted and deduplicated, so `(1,1,3)` behaves like `(1,3)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    indices: Vec<usize>,
}

impl Operation {
    pub fn new(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Indices inside a vector of length `dimension`. Anything past the end is a no-op.
    pub fn affects(&self, dimension: usize) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied().take_while(move |&i| i < dimension)
    }

    pub fn touches(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Target indicator lights (b vector of the GF(2) system)
    pub lights: Row,
    /// Buttons (columns of the A matrix), shared by both problems
    pub operations: Vec<Operation>,
    /// Joltage requirements, only present when the line has a `{...}` block
    pub joltages: Option<Vec<u64>>,
}

impl Machine {
    pub fn new(lights: Row, operations: Vec<Operation>, joltages: Option<Vec<u64>>) -> Self {
        let dimension = lights
            .len()
            .max(joltages.as_ref().map_or(0, |j| j.len()));
        for (button, op) in operations.iter().enumerate() {
            for &index in op.indices().iter().filter(|&&i| i >= dimension) {
                tracing::warn!(button, index, dimension, "button index out of range, ignoring it");
            }
        }
        Self {
            lights,
            operations,
            joltages,
        }
    }
}

/// Press counts per button. The cost of a solution is the total number of presses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    presses: Vec<u64>,
}

impl Solution {
    pub fn new(presses: Vec<u64>) -> Self {
        Self { presses }
    }

    pub fn from_toggles(bits: &BitSlice<usize, Lsb0>) -> Self {
        Self {
            presses: bits.iter().map(|b| u64::from(*b)).collect(),
        }
    }

    pub fn presses(&self) -> &[u64] {
        &self.presses
    }

    pub fn cost(&self) -> u64 {
        self.presses.iter().sum()
    }

    /// Lights after pressing every button `presses[j]` times, starting from all off.
    pub fn toggles(&self, operations: &[Operation], dimension: usize) -> Row {
        let mut lights = Row::repeat(false, dimension);
        for (op, &count) in operations.iter().zip(&self.presses) {
            if count % 2 == 1 {
                for i in op.affects(dimension) {
                    let lit = lights[i];
                    lights.set(i, !lit);
                }
            }
        }
        lights
    }

    /// Counter values after pressing every button `presses[j]` times, starting from zero.
    pub fn counters(&self, operations: &[Operation], dimension: usize) -> Vec<u64> {
        let mut counters = vec![0; dimension];
        for (op, &count) in operations.iter().zip(&self.presses) {
            for i in op.affects(dimension) {
                counters[i] += count;
            }
        }
        counters
    }

    pub fn reproduces_lights(&self, operations: &[Operation], lights: &BitSlice<usize, Lsb0>) -> bool {
        self.presses.len() == operations.len()
            && self.presses.iter().all(|&p| p <= 1)
            && self.toggles(operations, lights.len()).as_bitslice() == lights
    }

    pub fn reproduces_counters(&self, operations: &[Operation], target: &[u64]) -> bool {
        self.presses.len() == operations.len() && self.counters(operations, target.len()) == target
    }
}

fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Machine>, extra::Err<Rich<'a, char>>> {
    // Custom whitespace parser that excludes newlines
    let hspace = any().filter(|c: &char| *c == ' ' || *c == '\t').repeated();

    let light = choice((just('.').to(false), just('#').to(true)));

    // [.##.]
    let diagram = light
        .repeated()
        .collect::<Vec<bool>>()
        .map(|v| v.into_iter().collect::<Row>())
        .delimited_by(just('['), just(']'));

    // (0,2,3)
    let button = text::int(10)
        .from_str::<usize>()
        .unwrapped()
        .separated_by(just(','))
        .collect::<Vec<usize>>()
        .delimited_by(just('('), just(')'))
        .map(Operation::new);

    let buttons = button.padded_by(hspace).repeated().collect::<Vec<_>>();

    // {3,5,4,7}
    let joltages = text::int(10)
        .from_str::<u64>()
        .unwrapped()
        .separated_by(just(','))
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'));

    let machine = diagram
        .then_ignore(hspace)
        .then(buttons)
        .then(joltages.or_not())
        .then_ignore(hspace)
        .map(|((lights, operations), joltages)| Machine::new(lights, operations, joltages));

    machine
        .separated_by(text::newline())
        .allow_trailing()
        .collect()
}

/// Parses one machine per line.
pub fn parse(input: &str) -> Result<Vec<Machine>, ParseError> {
    parser().parse(input).into_result().map_err(|errors| ParseError {
        messages: errors.iter().map(ToString::to_string).collect(),
    })
}
