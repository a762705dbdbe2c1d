//! Run statistics
//!
//! Counts what happened to every requested book and prints the end-of-run
//! summary.

use crate::catalog::BookRecord;
use crate::ErrorKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Counters for one catalog run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished, if it did
    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages that could not be fetched
    pub skipped_pages: u64,

    /// Book ids handed to the assembler
    pub requested: u64,

    /// Books added to the catalog
    pub cataloged: u64,

    /// Ids that were already in the catalog
    pub duplicates: u64,

    /// Skipped books by error kind
    pub skipped: HashMap<ErrorKind, u64>,

    /// Book texts saved to disk
    pub texts_saved: u64,

    /// Cover images saved to disk
    pub covers_saved: u64,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    /// Starts a new run
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            skipped_pages: 0,
            requested: 0,
            cataloged: 0,
            duplicates: 0,
            skipped: HashMap::new(),
            texts_saved: 0,
            covers_saved: 0,
        }
    }

    /// Counts a skipped book
    pub fn record_skip(&mut self, kind: ErrorKind) {
        *self.skipped.entry(kind).or_insert(0) += 1;
    }

    /// Counts the assets saved for a cataloged book
    pub fn record_assets(&mut self, record: &BookRecord) {
        if record.text_path.is_some() {
            self.texts_saved += 1;
        }
        if record.cover_path.is_some() {
            self.covers_saved += 1;
        }
    }

    /// Total number of skipped books
    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Marks the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints the run summary to stdout
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_summary(stats: &RunStats) {
    println!("=== Catalog Summary ===\n");

    println!("Overview:");
    println!("  Books requested: {}", stats.requested);
    println!("  Books cataloged: {}", stats.cataloged);
    println!("  Books skipped: {}", stats.total_skipped());
    if stats.duplicates > 0 {
        println!("  Duplicate ids ignored: {}", stats.duplicates);
    }
    if stats.skipped_pages > 0 {
        println!("  Listing pages skipped: {}", stats.skipped_pages);
    }
    println!();

    println!("Downloads:");
    println!("  Texts saved: {}", stats.texts_saved);
    println!("  Covers saved: {}", stats.covers_saved);
    println!();

    if !stats.skipped.is_empty() {
        println!("Skip Reasons:");
        let mut reasons: Vec<_> = stats.skipped.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in reasons {
            println!("  {:?}: {}", kind, count);
        }
        println!();
    }

    let unique_requested = stats.requested.saturating_sub(stats.duplicates);
    let success_rate = if unique_requested > 0 {
        (stats.cataloged as f64 / unique_requested as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} books cataloged)",
        success_rate, stats.cataloged, unique_requested
    );

    if let Some(seconds) = stats.duration_seconds() {
        println!("Duration: {}s", seconds);
    }
}
