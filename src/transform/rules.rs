//! Rename and drop rule sets
//!
//! Rules are configuration data; [`super::RenameFields`] and
//! [`super::DropFields`] turn them into record transforms.

use crate::error::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// A single rename: source field name to target field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub from: String,
    pub to: String,
}

impl RenameRule {
    /// Create a new rename rule
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Parse `old=new`
    pub fn parse(spec: &str) -> Result<Self> {
        let (from, to) = spec
            .split_once('=')
            .ok_or_else(|| Error::invalid_value("rename", format!("expected old=new, got '{spec}'")))?;
        let rule = Self::new(from.trim(), to.trim());
        if rule.from.is_empty() || rule.to.is_empty() {
            return Err(Error::invalid_value(
                "rename",
                format!("empty field name in '{spec}'"),
            ));
        }
        Ok(rule)
    }

    /// Leaf name to write when the source resolved to a nested field
    pub(crate) fn target_leaf(&self) -> &str {
        self.to.rsplit('.').next().unwrap_or(&self.to)
    }
}

/// Ordered set of rename rules keyed by unique source name
///
/// Serialized as a mapping `old: new`, preserving declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameRules {
    rules: Vec<RenameRule>,
}

impl RenameRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, rejecting duplicate sources
    pub fn from_pairs<I, A, B>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        let mut rules = Self::new();
        for (from, to) in pairs {
            rules.insert(RenameRule::new(from, to))?;
        }
        Ok(rules)
    }

    /// Add a rule; the source name must not already be present
    pub fn insert(&mut self, rule: RenameRule) -> Result<()> {
        if self.rules.iter().any(|r| r.from == rule.from) {
            return Err(Error::invalid_value(
                "rename_rules",
                format!("duplicate rename source '{}'", rule.from),
            ));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Add or replace the rule for a source name
    pub fn upsert(&mut self, rule: RenameRule) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.from == rule.from) {
            existing.to = rule.to;
        } else {
            self.rules.push(rule);
        }
    }

    /// Target for a source name
    pub fn get(&self, from: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.from == from)
            .map(|r| r.to.as_str())
    }

    /// Check whether a name is the source of a rule
    pub fn is_source(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.from == name)
    }

    /// Check whether a name is the target of a rule
    pub fn is_target(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.to == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenameRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Structural checks that do not depend on other config fields
    pub fn validate(&self) -> Result<()> {
        let mut targets = HashSet::new();
        for rule in &self.rules {
            if rule.from.is_empty() || rule.to.is_empty() {
                return Err(Error::invalid_value(
                    "rename_rules",
                    "field names cannot be empty",
                ));
            }
            if !targets.insert(rule.to.as_str()) {
                return Err(Error::invalid_value(
                    "rename_rules",
                    format!("more than one rule renames to '{}'", rule.to),
                ));
            }
            if rule.to.contains('.') {
                let to_parent = parent_of(&rule.to);
                if !rule.from.contains('.') || parent_of(&rule.from) != to_parent {
                    return Err(Error::invalid_value(
                        "rename_rules",
                        format!(
                            "'{}' -> '{}' would move the field to another object",
                            rule.from, rule.to
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('.').map_or("", |(parent, _)| parent)
}

impl Serialize for RenameRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for rule in &self.rules {
            map.serialize_entry(&rule.from, &rule.to)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RenameRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = RenameRules;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of old field name to new field name")
            }

            fn visit_map<M: MapAccess<'de>>(
                self,
                mut access: M,
            ) -> std::result::Result<Self::Value, M::Error> {
                let mut rules = RenameRules::new();
                while let Some((from, to)) = access.next_entry::<String, String>()? {
                    rules
                        .insert(RenameRule::new(from, to))
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}
