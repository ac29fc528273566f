//! # dirctx-core
//!
//! Core types shared by directory connection factories.
//!
//! This crate provides the error type, the connection reference handed over by a
//! naming mechanism, and the key/value environment a directory connection is
//! initialized from.
//!
//! ## Modules
//!
//! - [`error`] - Error types and stable error codes
//! - [`reference`] - Connection references and their address entries
//! - [`environment`] - Connection environments and well-known property names

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod environment;
pub mod error;
pub mod reference;

// Re-export commonly used types
pub use environment::ConnectionEnvironment;
pub use error::{Error, Result};
pub use reference::{ConnectionReference, RefAddr};
