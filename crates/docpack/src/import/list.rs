use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::error::ImportError;
use crate::naming;

use super::item::{DocumentFormat, ItemId, SourceItem};

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added {
    pub id: ItemId,
    /// Another entry already carried the same `name.ext`.
    pub name_clash: bool,
}

/// Ordered, owned collection of imported documents.
///
/// Ids are handed out from a monotonic counter, so iteration order is import
/// order.
#[derive(Debug)]
pub struct ImportList {
    items: BTreeMap<ItemId, SourceItem>,
    next_id: u64,
}

impl ImportList {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Imports a document, accepting a clashing `name.ext`.
    pub fn add<P: AsRef<Path>>(&mut self, path: P) -> Result<Added, ImportError> {
        self.add_with_confirm(path, |_| true)
    }

    /// Imports a document. When its `name.ext` is already present, `confirm`
    /// decides whether it is added anyway.
    pub fn add_with_confirm<P, F>(&mut self, path: P, confirm: F) -> Result<Added, ImportError>
    where
        P: AsRef<Path>,
        F: FnOnce(&str) -> bool,
    {
        let path = path.as_ref();

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        if DocumentFormat::from_extension(&extension).is_none() {
            return Err(ImportError::UnsupportedFormat(extension));
        }

        let absolute = std::fs::canonicalize(path).map_err(|e| ImportError::Resolve {
            path: path.to_path_buf(),
            source: e,
        })?;

        if self.items.values().any(|item| item.source_path == absolute) {
            return Err(ImportError::DuplicatePath(absolute));
        }

        let stem = absolute
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(crate::sanitize::FALLBACK_NAME)
            .to_string();

        let full_name = naming::qualified_name(&stem, &extension);
        let name_clash = naming::conflicts(&full_name, self.full_names(None).iter().map(|s| s.as_str()));
        if name_clash && !confirm(&full_name) {
            return Err(ImportError::Declined(full_name));
        }

        let id = ItemId::new(self.next_id);
        let item = SourceItem::new(id, absolute, stem)
            .ok_or_else(|| ImportError::UnsupportedFormat(extension.clone()))?;
        self.next_id += 1;

        debug!("Imported item {} as '{}'", id, item.full_name());
        self.items.insert(id, item);

        Ok(Added { id, name_clash })
    }

    /// Renames the display name of an item.
    ///
    /// Rejected when the trimmed name is empty or when another entry already
    /// carries the same `name.ext`.
    pub fn rename(&mut self, id: ItemId, new_name: &str) -> Result<&SourceItem, ImportError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ImportError::EmptyName);
        }

        let extension = self
            .items
            .get(&id)
            .map(|item| item.extension.clone())
            .ok_or(ImportError::UnknownItem(id.get()))?;

        let candidate = naming::qualified_name(new_name, &extension);
        let others = self.full_names(Some(id));
        if naming::conflicts(&candidate, others.iter().map(|s| s.as_str())) {
            return Err(ImportError::NameConflict(candidate));
        }

        let item = self
            .items
            .get_mut(&id)
            .ok_or(ImportError::UnknownItem(id.get()))?;
        item.display_name = new_name.to_string();
        Ok(item)
    }

    /// Live check for an in-progress edit; does not modify the list.
    pub fn name_conflicts(&self, id: ItemId, candidate: &str) -> bool {
        let Some(item) = self.items.get(&id) else {
            return false;
        };
        let candidate = naming::qualified_name(candidate.trim(), &item.extension);
        let others = self.full_names(Some(id));
        naming::conflicts(&candidate, others.iter().map(|s| s.as_str()))
    }

    pub fn remove(&mut self, id: ItemId) -> Option<SourceItem> {
        self.items.remove(&id)
    }

    /// Clears the list and restarts ids at 1.
    pub fn reset(&mut self) {
        self.items.clear();
        self.next_id = 1;
    }

    pub fn get(&self, id: ItemId) -> Option<&SourceItem> {
        self.items.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Frozen copy of the list in import order, handed to the pipeline.
    pub fn snapshot(&self) -> Vec<SourceItem> {
        self.items.values().cloned().collect()
    }

    fn full_names(&self, exclude: Option<ItemId>) -> Vec<String> {
        self.items
            .values()
            .filter(|item| Some(item.id) != exclude)
            .map(SourceItem::full_name)
            .collect()
    }
}

impl Default for ImportList {
    fn default() -> Self {
        Self::new()
    }
}
