//! Day 10: Factory.
//!
//! Every machine has indicator lights, buttons and joltage counters. Pressing a
//! button toggles its lights and adds one to its counters. Part one asks for the
//! fewest presses that light the target pattern (a linear system over GF(2)), part
//! two for the fewest presses that reach the joltage targets exactly (the same
//! system over the non-negative integers).

pub mod aggregate;
pub mod brute_force;
pub mod elimination;
pub mod error;
pub mod gf2;
pub mod heuristic;
pub mod limits;
pub mod machine;
pub mod part1;
pub mod part2;
pub mod strategy;
