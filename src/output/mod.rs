//! Output module for catalog files and run reports
//!
//! This module handles:
//! - Writing and reading the JSON catalog
//! - Recording run statistics
//! - Printing the end-of-run summary

mod catalog_file;
pub mod stats;

pub use catalog_file::{catalog_to_json, read_catalog, write_catalog};
pub use stats::{print_summary, RunStats};
