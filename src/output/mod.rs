//! Output module for reporting on the harvested corpus
//!
//! This module handles:
//! - Gathering statistics from the dedup store and corpus directory
//! - Printing them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
