//! Field-level record transforms
//!
//! A name is matched as a literal top-level key first; only when the record
//! has no such key is a dotted name treated as a path into nested objects.

use super::rules::RenameRules;
use super::RecordTransform;
use crate::types::Record;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Path resolution
// ============================================================================

/// Resolve a field name against a record
///
/// Returns the parent path and the leaf key, or `None` when the name does
/// not address an existing field.
fn resolve<'n>(record: &Record, name: &'n str) -> Option<(Vec<&'n str>, &'n str)> {
    if record.contains_key(name) {
        return Some((Vec::new(), name));
    }
    if !name.contains('.') {
        return None;
    }

    let segments: Vec<&str> = name.split('.').collect();
    let (leaf, parents) = segments.split_last()?;
    let parent = object_at(record, parents)?;
    parent.contains_key(*leaf).then(|| (parents.to_vec(), *leaf))
}

fn object_at<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Record> {
    let mut current = record;
    for segment in path {
        current = current.get(*segment)?.as_object()?;
    }
    Some(current)
}

fn object_at_mut<'a>(record: &'a mut Record, path: &[&str]) -> Option<&'a mut Record> {
    let mut current = record;
    for segment in path {
        current = current.get_mut(*segment)?.as_object_mut()?;
    }
    Some(current)
}

/// Rename keys of one object simultaneously, keeping field positions
///
/// A target that already exists is replaced by the renamed value.
fn rename_keys(object: Record, renames: &HashMap<&str, &str>) -> Record {
    let displaced: HashSet<&str> = renames
        .iter()
        .filter(|(from, _)| object.contains_key(**from))
        .map(|(_, to)| *to)
        .collect();

    let mut renamed = Record::new();
    for (key, value) in object {
        if let Some(to) = renames.get(key.as_str()) {
            renamed.insert((*to).to_string(), value);
        } else if !displaced.contains(key.as_str()) {
            renamed.insert(key, value);
        }
    }
    renamed
}

// ============================================================================
// Rename
// ============================================================================

/// Renames fields according to a rule set
#[derive(Debug, Clone, Default)]
pub struct RenameFields {
    rules: RenameRules,
}

impl RenameFields {
    /// Create a rename transform
    pub fn new(rules: RenameRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RenameRules {
        &self.rules
    }
}

impl RecordTransform for RenameFields {
    fn apply(&self, mut record: Record) -> Record {
        if self.rules.is_empty() {
            return record;
        }

        // Group every applicable rule by the object that holds its source,
        // so each object is rebuilt once and renames never chain.
        let mut groups: Vec<(Vec<&str>, HashMap<&str, &str>)> = Vec::new();
        for rule in self.rules.iter() {
            let Some((parent, leaf)) = resolve(&record, &rule.from) else {
                continue;
            };
            let target = if parent.is_empty() {
                rule.to.as_str()
            } else {
                rule.target_leaf()
            };
            match groups.iter_mut().find(|(p, _)| *p == parent) {
                Some((_, renames)) => {
                    renames.insert(leaf, target);
                }
                None => groups.push((parent, HashMap::from([(leaf, target)]))),
            }
        }

        // Deepest objects first: rebuilding a child never moves its ancestors,
        // while renaming an ancestor would hide the child's path.
        groups.sort_by_key(|(parent, _)| std::cmp::Reverse(parent.len()));

        for (parent, renames) in groups {
            if let Some(object) = object_at_mut(&mut record, &parent) {
                let taken = std::mem::take(object);
                *object = rename_keys(taken, &renames);
            }
        }
        record
    }

    fn name(&self) -> &'static str {
        "rename_fields"
    }
}

// ============================================================================
// Drop
// ============================================================================

/// Removes named fields; absent fields are ignored
#[derive(Debug, Clone, Default)]
pub struct DropFields {
    fields: Vec<String>,
}

impl DropFields {
    /// Create a drop transform
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

impl RecordTransform for DropFields {
    fn apply(&self, mut record: Record) -> Record {
        if self.fields.is_empty() {
            return record;
        }

        let mut top_level: HashSet<&str> = HashSet::new();
        let mut nested: Vec<(Vec<&str>, &str)> = Vec::new();
        for field in &self.fields {
            match resolve(&record, field) {
                Some((parent, leaf)) if parent.is_empty() => {
                    top_level.insert(leaf);
                }
                Some(path) => nested.push(path),
                None => {}
            }
        }

        for (parent, leaf) in nested {
            if let Some(object) = object_at_mut(&mut record, &parent) {
                let taken = std::mem::take(object);
                *object = taken.into_iter().filter(|(k, _)| k != leaf).collect();
            }
        }

        if top_level.is_empty() {
            return record;
        }
        record
            .into_iter()
            .filter(|(k, _)| !top_level.contains(k.as_str()))
            .collect()
    }

    fn name(&self) -> &'static str {
        "drop_fields"
    }
}
