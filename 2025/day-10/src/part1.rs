use miette::*;

use crate::aggregate::{Aggregator, Problem};
use crate::machine::parse;

#[tracing::instrument(skip(input))]
pub fn process(input: &str) -> Result<String> {
    let machines = parse(input)?;
    let total_presses = Aggregator::default().total(&machines, Problem::Lights)?;
    Ok(total_presses.to_string())
}
