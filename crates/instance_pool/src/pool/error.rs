//! Pool error types

use std::any::TypeId;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors reported by the registry and initializer
///
/// None of these leave a container half-modified: they are raised before
/// any container state is touched.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A prototype name did not resolve through the catalog
    #[error("No prototype named `{0}` in the catalog")]
    UnknownPrototype(String),

    /// A runtime-typed prototype has no registered dispatch entry
    #[error("No pool dispatch registered for prototype type {type_id:?}")]
    UnresolvedDispatch {
        /// Runtime type of the prototype
        type_id: TypeId,
    },

    /// A type-erased instance did not downcast to the expected instance type
    #[error("Instance is not a `{expected}`")]
    InstanceTypeMismatch {
        /// Instance type the dispatch entry serves
        expected: &'static str,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
