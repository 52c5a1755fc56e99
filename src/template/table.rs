//! Replacement table: the merged key -> value lookup used during substitution

use std::collections::BTreeMap;

/// A single key-value source
pub type Mapping = BTreeMap<String, String>;

/// Replacement sources handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacements {
    /// One mapping, used as-is
    Single(Mapping),
    /// Several mappings; on a duplicate key the earliest mapping wins
    Ordered(Vec<Mapping>),
}

impl From<Mapping> for Replacements {
    fn from(mapping: Mapping) -> Self {
        Replacements::Single(mapping)
    }
}

impl From<Vec<Mapping>> for Replacements {
    fn from(mappings: Vec<Mapping>) -> Self {
        Replacements::Ordered(mappings)
    }
}

/// Merged, read-only replacement table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementTable {
    entries: Mapping,
}

impl ReplacementTable {
    /// Build the table from any replacement source shape
    pub fn build(replacements: Replacements) -> Self {
        match replacements {
            Replacements::Single(mapping) => Self::from_mapping(mapping),
            Replacements::Ordered(mappings) => Self::from_sources(&mappings),
        }
    }

    /// Wrap a single mapping without any override logic
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self { entries: mapping }
    }

    /// Merge sources so that the first source defining a key wins
    pub fn from_sources(sources: &[Mapping]) -> Self {
        let mut entries = Mapping::new();
        for source in sources {
            for (key, value) in source {
                if !entries.contains_key(key) {
                    entries.insert(key.clone(), value.clone());
                }
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.entries
    }
}
