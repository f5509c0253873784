//! Resource categories and normalised identifiers

use std::fmt;

/// Which metadata source a resource is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Table,
    Task,
}

impl Category {
    /// Categories in the order a cycle checks them
    pub const ALL: [Category; 2] = [Category::Table, Category::Task];

    /// Plural label used in status output
    pub fn label(self) -> &'static str {
        match self {
            Self::Table => "snowflake tables",
            Self::Task => "snowflake tasks",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A lowercased `schema.name` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    /// Normalise a raw identifier
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declared resources of one category, deduplicated, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    ids: Vec<ResourceId>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier; returns false if it was already declared
    pub fn insert(&mut self, id: ResourceId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.ids.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for raw in iter {
            set.insert(ResourceId::new(raw.as_ref()));
        }
        set
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceId;
    type IntoIter = std::slice::Iter<'a, ResourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}
