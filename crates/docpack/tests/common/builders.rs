//! Builders for assembling import lists without per-test boilerplate.

#![allow(dead_code)]

use docpack::import::{ImportList, SourceItem};

use super::TestHarness;

struct Entry {
    file: String,
    content: String,
    rename: Option<String>,
}

/// Builder for a batch of documents written into a harness input directory.
pub struct BatchBuilder {
    entries: Vec<Entry>,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a document whose display name defaults to the file stem.
    pub fn document(mut self, file: &str, content: &str) -> Self {
        self.entries.push(Entry {
            file: file.to_string(),
            content: content.to_string(),
            rename: None,
        });
        self
    }

    /// Adds a document and renames it after import.
    pub fn named(mut self, file: &str, content: &str, name: &str) -> Self {
        self.entries.push(Entry {
            file: file.to_string(),
            content: content.to_string(),
            rename: Some(name.to_string()),
        });
        self
    }

    pub fn build_list(self, harness: &TestHarness) -> ImportList {
        let mut list = ImportList::new();
        for entry in self.entries {
            let path = harness.write_input(&entry.file, &entry.content);
            let id = list.add(&path).expect("Failed to import").id;
            if let Some(name) = entry.rename {
                list.rename(id, &name).expect("Failed to rename");
            }
        }
        list
    }

    pub fn build(self, harness: &TestHarness) -> Vec<SourceItem> {
        self.build_list(harness).snapshot()
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
