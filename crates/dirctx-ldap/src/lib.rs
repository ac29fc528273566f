//! LDAP connection factory and attribute helpers.
//!
//! This crate turns a [`ConnectionReference`](dirctx_core::ConnectionReference) into a live
//! directory session and provides null-safe helpers for reading attribute values and deciding
//! which modification to apply to an entry.

#![deny(missing_docs)]

mod attribute;
mod connector;
mod factory;
mod modification;
mod settings;

pub use attribute::{
    validate_attribute, validate_attribute_or, AttributeAccess, AttributeError, AttributeValue,
    Attributes, BasicAttribute,
};
pub use connector::{DirectoryConnector, DirectoryContext, LdapConnector, LdapContext};
pub use factory::{build_environment, ConnectionFactory, ObjectFactory};
pub use modification::{compute_modification, ModificationItem, ModificationKind};
pub use settings::{
    AuthenticationMode, LdapSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_OPERATION_TIMEOUT_SECS,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirctx_core::Result<T>;
