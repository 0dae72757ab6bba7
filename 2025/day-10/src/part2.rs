use miette::*;

use crate::aggregate::{Aggregator, Problem};
use crate::machine::parse;

#[tracing::instrument(skip(input))]
pub fn process(input: &str) -> Result<String> {
    let machines = parse(input)?;
    let total = Aggregator::default()
        .parallel(true)
        .total(&machines, Problem::Joltage)?;
    Ok(total.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() -> Result<()> {
        let input = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";
        assert_eq!("33", process(input)?);
        Ok(())
    }

    #[test]
    fn missing_joltages_are_an_error() {
        assert!(process("[.#] (1)").is_err());
    }
}
