//! Attribute modification items and the rule deciding which one to apply.

use ldap3::Mod;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of a [`ModificationItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationKind {
    /// Add a value.
    Add,
    /// Replace all values.
    Replace,
    /// Remove the attribute.
    Remove,
}

/// A single pending change to an attribute of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModificationItem {
    /// Add `value` to the attribute.
    Add {
        /// Attribute to modify.
        key: String,
        /// Value to add.
        value: String,
    },
    /// Replace the attribute's values with `value`.
    Replace {
        /// Attribute to modify.
        key: String,
        /// Replacement value.
        value: String,
    },
    /// Remove the attribute entirely.
    Remove {
        /// Attribute to remove.
        key: String,
    },
}

impl ModificationItem {
    /// Returns the kind of modification.
    #[must_use]
    pub const fn kind(&self) -> ModificationKind {
        match self {
            Self::Add { .. } => ModificationKind::Add,
            Self::Replace { .. } => ModificationKind::Replace,
            Self::Remove { .. } => ModificationKind::Remove,
        }
    }

    /// Returns the attribute the modification applies to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Add { key, .. } | Self::Replace { key, .. } | Self::Remove { key } => key,
        }
    }

    /// Returns the new value; `None` for removals.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Add { value, .. } | Self::Replace { value, .. } => Some(value),
            Self::Remove { .. } => None,
        }
    }
}

impl From<ModificationItem> for Mod<String> {
    fn from(item: ModificationItem) -> Self {
        match item {
            ModificationItem::Add { key, value } => Mod::Add(key, HashSet::from([value])),
            ModificationItem::Replace { key, value } => Mod::Replace(key, HashSet::from([value])),
            // An empty value set deletes the whole attribute.
            ModificationItem::Remove { key } => Mod::Delete(key, HashSet::new()),
        }
    }
}

/// Decides which modification, if any, brings an attribute from `old_value` to `new_value`.
///
/// | `new_value` empty | `old_value` empty | result |
/// |---|---|---|
/// | yes | yes | `None` |
/// | yes | no | [`ModificationItem::Remove`] |
/// | no | any | [`ModificationItem::Replace`] with `new_value` |
///
/// A non-empty new value is always a replace, even when the attribute had no previous value.
#[must_use]
pub fn compute_modification(
    key: &str,
    new_value: &str,
    old_value: &str,
) -> Option<ModificationItem> {
    match (new_value.is_empty(), old_value.is_empty()) {
        (true, true) => None,
        (true, false) => Some(ModificationItem::Remove {
            key: key.to_string(),
        }),
        (false, _) => Some(ModificationItem::Replace {
            key: key.to_string(),
            value: new_value.to_string(),
        }),
    }
}
