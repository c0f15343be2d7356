use std::collections::{HashMap, HashSet};

/// Collision-free assignment of final output base names for one export run.
///
/// The first claim of a base name returns it unchanged, later claims get a
/// `_k` suffix from a running per-name counter. Names are compared
/// case-insensitively and qualified with the output extension, so `Rapport`
/// and `rapport` cannot both land in the same archive.
#[derive(Debug)]
pub struct NameRegistry {
    extension: String,
    counters: HashMap<String, u32>,
    issued: HashSet<String>,
}

impl NameRegistry {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            counters: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Registry for PDF output, the only format the exporter writes.
    pub fn for_pdf() -> Self {
        Self::new("pdf")
    }

    /// Reserves `base_name` and returns the final, unique base name.
    ///
    /// Never consults the filesystem. The result depends only on the order
    /// of previous calls on this instance.
    pub fn reserve(&mut self, base_name: &str) -> String {
        let counter = self.counters.entry(fold(base_name)).or_insert(0);

        loop {
            let candidate = if *counter == 0 {
                base_name.to_string()
            } else {
                format!("{}_{}", base_name, counter)
            };
            *counter += 1;

            // A literal `name_1` reserved earlier must not be handed out twice.
            if self
                .issued
                .insert(fold(&qualified_name(&candidate, &self.extension)))
            {
                return candidate;
            }
        }
    }

    /// Returns true if `name` has already been handed out by this registry.
    pub fn is_issued(&self, name: &str) -> bool {
        self.issued
            .contains(&fold(&qualified_name(name, &self.extension)))
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

/// Joins a base name and an extension (with or without leading dot).
pub fn qualified_name(base_name: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        base_name.to_string()
    } else {
        format!("{}.{}", base_name, extension)
    }
}

/// Live check used while a name is being edited.
///
/// `others` holds the current extension-qualified names of every entry except
/// the one being edited. Export-time resolution never relies on this result.
pub fn conflicts<'a, I>(candidate: &str, others: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let candidate = fold(candidate);
    others.into_iter().any(|other| fold(other) == candidate)
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}
