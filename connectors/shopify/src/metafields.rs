//! Required metafields and their aliased selections.
//!
//! Every requirement is fetched under its own alias (`mf0`, `mf1`, ...) so a
//! single query can ask for several `metafield(namespace:, key:)` fields on
//! the same node without the response keys colliding.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{AuditError, AuditResult};

/// One required metafield.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetafieldRequirement {
    /// Part before the first dot, e.g. `custom`.
    pub namespace: String,
    /// Everything after the first dot.
    pub key: String,
}

impl MetafieldRequirement {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> AuditResult<Self> {
        let requirement = Self {
            namespace: namespace.into(),
            key: key.into(),
        };
        validate_identifier(&requirement.namespace)?;
        validate_identifier(&requirement.key)?;
        Ok(requirement)
    }

    /// Parse a comma-separated `namespace.key` list. Blank entries are skipped.
    pub fn parse_list(raw: &str) -> AuditResult<Vec<Self>> {
        raw.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for MetafieldRequirement {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, key) = s.trim().split_once('.').ok_or_else(|| {
            AuditError::config(format!("metafield `{s}` must be written as namespace.key"))
        })?;
        Self::new(namespace, key)
    }
}

impl fmt::Display for MetafieldRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

// Identifiers are interpolated into quoted GraphQL string arguments.
fn validate_identifier(value: &str) -> AuditResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AuditError::config(format!(
            "invalid metafield identifier `{value}`"
        )))
    }
}

/// Ordered requirements, each bound to a unique response alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasedMetafields {
    entries: Vec<(String, MetafieldRequirement)>,
}

impl AliasedMetafields {
    /// Bind aliases to `requirements`, rejecting duplicate pairs.
    pub fn new(requirements: Vec<MetafieldRequirement>) -> AuditResult<Self> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(requirements.len());
        for (index, requirement) in requirements.into_iter().enumerate() {
            if !seen.insert(requirement.clone()) {
                return Err(AuditError::config(format!(
                    "metafield `{requirement}` is required twice"
                )));
            }
            entries.push((format!("mf{index}"), requirement));
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Aliases in requirement order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(alias, _)| alias.as_str())
    }

    pub fn requirements(&self) -> impl Iterator<Item = &MetafieldRequirement> {
        self.entries.iter().map(|(_, requirement)| requirement)
    }

    /// Selection fragment asking for each metafield's existence.
    #[must_use]
    pub fn selection(&self) -> String {
        self.entries
            .iter()
            .map(|(alias, r)| {
                format!(
                    "{alias}: metafield(namespace: \"{}\", key: \"{}\") {{ id }}",
                    r.namespace, r.key
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `namespace.key` of every requirement whose alias is absent or null.
    #[must_use]
    pub fn missing(&self, node: &Value) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(alias, _)| node.get(alias).is_none_or(Value::is_null))
            .map(|(_, requirement)| requirement.to_string())
            .collect()
    }
}
