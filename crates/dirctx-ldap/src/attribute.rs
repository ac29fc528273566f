//! Null-safe access to directory attribute values.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

const LABEL_ATTRIBUTE_DID_NOT_EXIST: &str = "Attribute did not exist";
const LABEL_ATTRIBUTE_VALUE_COULD_NOT_BE_OBTAINED: &str = "Attribute value could not be obtained";

/// Reasons reading an attribute value can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    /// The attribute holds no value.
    #[error("attribute has no value")]
    NoSuchElement,
    /// The directory failed to deliver the value.
    #[error("attribute value could not be read: {0}")]
    Naming(String),
}

/// A single attribute value as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// UTF-8 value.
    Text(String),
    /// Binary value.
    Binary(Vec<u8>),
}

impl AttributeValue {
    /// Returns the value as text, decoding binary values lossily.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// Read access to the value of one directory attribute.
#[cfg_attr(test, mockall::automock)]
pub trait AttributeAccess {
    /// Returns the first (or sole) value of the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::NoSuchElement`] when the attribute has no value and
    /// [`AttributeError::Naming`] when the value cannot be obtained.
    fn get(&self) -> Result<AttributeValue, AttributeError>;
}

/// In-memory attribute with an id and an ordered list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAttribute {
    id: String,
    values: Vec<AttributeValue>,
}

impl BasicAttribute {
    /// Creates an attribute without values.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: Vec::new(),
        }
    }

    /// Appends a value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Attribute id (name).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All values in server order.
    #[must_use]
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn size(&self) -> usize {
        self.values.len()
    }
}

impl AttributeAccess for BasicAttribute {
    fn get(&self) -> Result<AttributeValue, AttributeError> {
        self.values
            .first()
            .cloned()
            .ok_or(AttributeError::NoSuchElement)
    }
}

/// Attributes of one directory entry, looked up by case-insensitive id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    attributes: Vec<BasicAttribute>,
}

impl Attributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, replacing one with the same id.
    pub fn put(&mut self, attribute: BasicAttribute) {
        match self
            .attributes
            .iter_mut()
            .find(|existing| existing.id.eq_ignore_ascii_case(&attribute.id))
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Returns the attribute with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BasicAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.id.eq_ignore_ascii_case(id))
    }

    /// Iterates over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = &BasicAttribute> {
        self.attributes.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if no attributes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<BasicAttribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = BasicAttribute>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for attribute in iter {
            attributes.put(attribute);
        }
        attributes
    }
}

/// Returns the string value of an attribute, or an empty string if it is absent or unreadable.
///
/// Never fails. Read failures are logged as a `debug` label followed by a `trace` detail.
#[must_use]
pub fn validate_attribute<A>(attribute: Option<&A>) -> String
where
    A: AttributeAccess + ?Sized,
{
    validate_attribute_or(attribute, "")
}

/// Returns the string value of an attribute, or `default_value` if it is absent or unreadable.
///
/// Never fails. Read failures are logged as a `debug` label followed by a `trace` detail.
#[must_use]
pub fn validate_attribute_or<A>(attribute: Option<&A>, default_value: &str) -> String
where
    A: AttributeAccess + ?Sized,
{
    let Some(attribute) = attribute else {
        return default_value.to_string();
    };

    match attribute.get() {
        Ok(value) => value.to_string(),
        Err(err) => {
            let label = match &err {
                AttributeError::NoSuchElement => LABEL_ATTRIBUTE_DID_NOT_EXIST,
                AttributeError::Naming(_) => LABEL_ATTRIBUTE_VALUE_COULD_NOT_BE_OBTAINED,
            };
            debug!("{label}");
            trace!(error = ?err, "{err}");
            default_value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_attribute_yields_default() {
        assert_eq!(validate_attribute(None::<&BasicAttribute>), "");
        assert_eq!(validate_attribute_or(None::<&BasicAttribute>, "d"), "d");
    }

    #[test]
    fn attribute_without_value_yields_default() {
        let attribute = BasicAttribute::new("mail");
        assert_eq!(validate_attribute(Some(&attribute)), "");
        assert_eq!(validate_attribute_or(Some(&attribute), "n/a"), "n/a");
    }

    #[test]
    fn unreadable_attribute_yields_default() {
        let mut attribute = MockAttributeAccess::new();
        attribute
            .expect_get()
            .times(2)
            .returning(|| Err(AttributeError::Naming("connection reset".to_string())));

        assert_eq!(validate_attribute(Some(&attribute)), "");
        assert_eq!(validate_attribute_or(Some(&attribute), "fallback"), "fallback");
    }

    #[test]
    fn mock_without_value_yields_default() {
        let mut attribute = MockAttributeAccess::new();
        attribute
            .expect_get()
            .returning(|| Err(AttributeError::NoSuchElement));

        assert_eq!(validate_attribute_or(Some(&attribute), "x"), "x");
    }

    #[test]
    fn first_value_is_returned() {
        let attribute = BasicAttribute::new("cn")
            .with_value("John Doe")
            .with_value("Johnny");
        assert_eq!(validate_attribute(Some(&attribute)), "John Doe");
        assert_eq!(validate_attribute_or(Some(&attribute), "d"), "John Doe");
        assert_eq!(attribute.size(), 2);
    }

    #[test]
    fn empty_string_value_is_kept() {
        let attribute = BasicAttribute::new("description").with_value("");
        assert_eq!(validate_attribute_or(Some(&attribute), "d"), "");
    }

    #[test]
    fn binary_value_uses_lossy_text() {
        let attribute = BasicAttribute::new("jpegPhoto").with_value(vec![b'o', b'k', 0xff]);
        assert_eq!(validate_attribute(Some(&attribute)), "ok\u{fffd}");
    }

    #[test]
    fn works_through_trait_objects() {
        let attribute = BasicAttribute::new("uid").with_value("jdoe");
        let dynamic: &dyn AttributeAccess = &attribute;
        assert_eq!(validate_attribute(Some(dynamic)), "jdoe");
    }

    #[test]
    fn attributes_lookup_is_case_insensitive() {
        let attributes: Attributes = [
            BasicAttribute::new("givenName").with_value("John"),
            BasicAttribute::new("SN").with_value("Doe"),
            BasicAttribute::new("sn").with_value("Smith"),
        ]
        .into_iter()
        .collect();

        assert_eq!(attributes.len(), 2);
        assert_eq!(validate_attribute(attributes.get("GIVENNAME")), "John");
        assert_eq!(validate_attribute(attributes.get("sn")), "Smith");
        assert_eq!(validate_attribute_or(attributes.get("mail"), "none"), "none");
    }
}
