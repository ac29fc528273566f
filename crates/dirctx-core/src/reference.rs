//! Connection references handed to factories by a naming mechanism.
//!
//! A reference describes how to reconstruct a resource: the kind of object it stands for and an
//! ordered list of address entries, each a property name paired with arbitrary content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single address entry of a [`ConnectionReference`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefAddr {
    /// Property name this entry carries.
    #[serde(rename = "type")]
    pub addr_type: String,
    /// Property content, usually a string.
    pub content: Value,
}

impl RefAddr {
    /// Creates a new address entry.
    #[must_use]
    pub fn new(addr_type: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            addr_type: addr_type.into(),
            content: content.into(),
        }
    }

    /// Returns the content rendered for display.
    ///
    /// Strings are shown without JSON quoting; other values use their JSON form.
    #[must_use]
    pub fn content_display(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Reference describing how to construct a directory connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReference {
    /// Type name of the object this reference resolves to.
    pub class_name: String,
    /// Name of the factory expected to build the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    /// Address entries in the order provided by the naming mechanism.
    #[serde(default)]
    addrs: Vec<RefAddr>,
}

impl ConnectionReference {
    /// Creates an empty reference for the given object type.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            factory: None,
            addrs: Vec::new(),
        }
    }

    /// Parses a reference from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidReference`] if the JSON does not describe a reference.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the factory name.
    #[must_use]
    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = Some(factory.into());
        self
    }

    /// Appends an address entry.
    #[must_use]
    pub fn with_addr(mut self, addr_type: impl Into<String>, content: impl Into<Value>) -> Self {
        self.add(RefAddr::new(addr_type, content));
        self
    }

    /// Appends an address entry in place.
    pub fn add(&mut self, addr: RefAddr) {
        self.addrs.push(addr);
    }

    /// Returns all address entries in order.
    #[must_use]
    pub fn all(&self) -> &[RefAddr] {
        &self.addrs
    }

    /// Returns the first entry with the given property name.
    #[must_use]
    pub fn get(&self, addr_type: &str) -> Option<&RefAddr> {
        self.addrs.iter().find(|addr| addr.addr_type == addr_type)
    }

    /// Number of address entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Returns true if the reference carries no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}
