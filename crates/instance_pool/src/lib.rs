//! # Instance Pool
//!
//! Prototype-keyed object pooling for engine scene objects.
//!
//! ## Features
//!
//! - **O(1) Retire / Reclaim**: one swap across an active/pooled partition
//! - **Implicit Retirement**: deactivating an instance through the host pools it
//! - **Per-Prototype Pools**: pools are keyed by prototype identity
//! - **Erased Dispatch**: configuration-driven callers work without naming types
//! - **Pre-Warming**: TOML/RON initializer lists fill pools at startup
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use instance_pool::prelude::*;
//!
//! let mut scene = Scene::new();
//! let mut pools = PoolRegistry::<Scene>::new();
//! let bullet = Rc::new(Prefab::new("bullet"));
//!
//! // Fire, then let the bullet expire by deactivating it
//! let shot = pools.get(&mut scene, &bullet, &Placement::at(Vec3::new(0.0, 0.0, 1.0)));
//! scene.set_active(shot, false);
//! assert_eq!(pools.pooled_count(&bullet), 1);
//!
//! // The next shot reuses it
//! let next = pools.get(&mut scene, &bullet, &Placement::origin());
//! assert_eq!(shot, next);
//!
//! pools.shutdown(&mut scene);
//! assert!(scene.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod pool;
pub mod scene;

/// Common imports for pool users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, InitializerConfig, InitializerElement, PoolConfig},
        foundation::math::{Placement, Quat, Vec3},
        pool::{
            LifecycleTracker, NamedPrototypes, PlacementService, PoolContainer, PoolError, PoolHost,
            PoolInitializer, PoolRegistry, PoolStats, PrewarmReport, Prototype, PrototypeCatalog,
            ResourceFactory,
        },
        scene::{ObjectFlags, ObjectHandle, Prefab, Scene},
    };
}
