//! Catalog data model
//!
//! # Components
//!
//! - `ParsedBook`: fields extracted from a detail page
//! - `BookRecord`: one fully assembled catalog entry
//! - `Catalog`: ordered, duplicate-free collection of records

mod record;

pub use record::{BookRecord, ParsedBook};

use std::collections::HashSet;

/// Ordered collection of book records with at most one entry per id
///
/// Records keep the order in which they were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<BookRecord>,
    ids: HashSet<u64>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from records, dropping later duplicates
    pub fn from_records(records: impl IntoIterator<Item = BookRecord>) -> Self {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Appends a record
    ///
    /// Returns false, leaving the catalog untouched, if a record with the same
    /// id is already present.
    pub fn insert(&mut self, record: BookRecord) -> bool {
        if !self.ids.insert(record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Returns true if a record with this id is present
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn get(&self, id: u64) -> Option<&BookRecord> {
        if !self.contains(id) {
            return None;
        }
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<BookRecord> {
        self.records
    }
}
