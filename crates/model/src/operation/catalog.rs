use crate::operation::spec::OperationSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered set of operations. Declaration order is execution order: later
/// entries may rely on data changed by earlier ones.
///
/// Specs are immutable once added; the catalog only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: String,
    operations: Vec<OperationSpec>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn with(mut self, spec: OperationSpec) -> Self {
        self.operations.push(spec);
        self
    }

    pub fn push(&mut self, spec: OperationSpec) {
        self.operations.push(spec);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OperationSpec> {
        self.operations.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationSpec> {
        self.operations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name.as_str())
    }

    /// Names that appear more than once, in first-seen order. Duplicates are
    /// allowed; they only make reports harder to read.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();
        for name in self.names() {
            let count = counts.entry(name).or_default();
            *count += 1;
            if *count == 2 {
                duplicates.push(name.to_string());
            }
        }
        duplicates
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a OperationSpec;
    type IntoIter = std::slice::Iter<'a, OperationSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
