//! Connection environments.
//!
//! An environment is the key/value mapping a directory connection is initialized from. It is
//! built fresh for every connection and never cached.

use serde_json::Value;
use std::collections::HashMap;
use tracing::trace;

/// Well-known property names understood by the LDAP connector.
///
/// Every property on a reference is forwarded regardless; these names are documented, not
/// enforced.
pub mod properties {
    /// Informational name of the requested connection factory.
    pub const INITIAL_FACTORY: &str = "ldap.factory.initial";
    /// Directory URL (`ldap://`, `ldaps://` or `ldapi://`), optionally with a base DN path.
    pub const PROVIDER_URL: &str = "ldap.provider.url";
    /// Authentication mode: `none`, `simple` or `EXTERNAL`.
    pub const SECURITY_AUTHENTICATION: &str = "ldap.security.authentication";
    /// Bind distinguished name.
    pub const SECURITY_PRINCIPAL: &str = "ldap.security.principal";
    /// Bind password.
    pub const SECURITY_CREDENTIALS: &str = "ldap.security.credentials";
    /// Connection timeout in seconds.
    pub const CONNECT_TIMEOUT_SECS: &str = "ldap.connect.timeout.secs";
    /// Per-operation timeout in seconds.
    pub const OPERATION_TIMEOUT_SECS: &str = "ldap.operation.timeout.secs";
    /// Whether TLS certificates are verified.
    pub const TLS_VERIFY: &str = "ldap.tls.verify";
    /// Whether to upgrade a plain connection with StartTLS.
    pub const STARTTLS: &str = "ldap.starttls";

    /// Returns true if the property holds a secret that must not be logged.
    #[must_use]
    pub fn is_sensitive(name: &str) -> bool {
        name == SECURITY_CREDENTIALS
    }
}

/// Key/value environment used to initialize a directory connection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionEnvironment {
    entries: HashMap<String, Value>,
}

impl ConnectionEnvironment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let previous = self.entries.insert(name.clone(), value.into());
        if previous.is_some() {
            trace!(property = %name, "environment property overwritten");
        }
        previous
    }

    /// Returns the raw value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Returns a property as text.
    ///
    /// Strings are returned as-is, numbers and booleans in their literal form. Other JSON values
    /// yield `None`.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.entries.get(name)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Returns true if the property is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over all properties in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the environment holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ConnectionEnvironment
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut environment = Self::new();
        for (name, value) in iter {
            environment.insert(name, value);
        }
        environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_overwrites_existing_value() {
        let mut environment = ConnectionEnvironment::new();
        assert!(environment.insert("cn", "first").is_none());
        assert_eq!(environment.insert("cn", "second"), Some(json!("first")));
        assert_eq!(environment.len(), 1);
        assert_eq!(environment.get("cn"), Some(&json!("second")));
    }

    #[test]
    fn get_str_renders_scalars() {
        let environment: ConnectionEnvironment = [
            ("text", json!("value")),
            ("number", json!(30)),
            ("flag", json!(false)),
            ("list", json!(["a"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(environment.get_str("text").as_deref(), Some("value"));
        assert_eq!(environment.get_str("number").as_deref(), Some("30"));
        assert_eq!(environment.get_str("flag").as_deref(), Some("false"));
        assert_eq!(environment.get_str("list"), None);
        assert_eq!(environment.get_str("missing"), None);
        assert!(environment.contains("list"));
    }

    #[test]
    fn credentials_are_sensitive() {
        assert!(properties::is_sensitive(properties::SECURITY_CREDENTIALS));
        assert!(!properties::is_sensitive(properties::SECURITY_PRINCIPAL));
    }
}
