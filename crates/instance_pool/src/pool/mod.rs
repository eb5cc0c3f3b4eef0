//! Object pooling
//!
//! Recycles instances of a prototype instead of creating and destroying them
//! every time gameplay needs one. The pieces, bottom-up:
//!
//! - [`LifecycleTracker`]: rides along with each instance and turns the
//!   host's enable/disable/destroy transitions into pool notifications
//! - [`PoolContainer`]: one prototype's instances in a single array split
//!   into an active and a pooled segment, with O(1) moves between them
//! - [`PoolRegistry`]: finds (or lazily creates) the container for a
//!   prototype and exposes the public get/create/destroy operations
//! - [`PoolInitializer`]: pre-warms pools from configuration at startup
//!
//! Retiring an instance is not an API call. The caller simply deactivates it
//! through the host, and the tracker moves it into the pooled segment.

pub mod container;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod initializer;
pub mod registry;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use container::PoolContainer;
pub use dispatch::ErasedInstances;
pub use error::PoolError;
pub use host::{PlacementService, PoolHost, Prototype, ResourceFactory};
pub use initializer::{NamedPrototypes, PoolInitializer, PrewarmReport, PrototypeCatalog};
pub use registry::{PoolRegistry, PoolStats, PrototypeKey};
pub use tracker::{LifecycleTracker, PoolObjectManager};
