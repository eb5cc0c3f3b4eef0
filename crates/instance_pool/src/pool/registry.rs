//! Prototype-Keyed Pool Registry
//!
//! Public face of the pooling system. Every distinct prototype value gets its
//! own [`PoolContainer`], created lazily on first use. Prototypes are keyed by
//! identity, not by type or contents: two prototypes of the same type produce
//! instances that are not interchangeable, so they never share a pool.
//!
//! # Architecture
//!
//! ```text
//! PoolRegistry<H>
//!   ├── TypeId(P) -> PrototypePools<P>
//!   │        └── PrototypeKey -> (Rc<P>, Rc<PoolContainer<P::Instance>>)
//!   └── TypeId(P) -> DispatchEntry<H>   (erased entry points)
//! ```
//!
//! # Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use instance_pool::prelude::*;
//!
//! let mut scene = Scene::new();
//! let mut pools = PoolRegistry::<Scene>::new();
//! let bullet = Rc::new(Prefab::new("bullet"));
//!
//! let first = pools.get(&mut scene, &bullet, &Placement::origin());
//! scene.set_active(first, false); // retired into the pool
//!
//! let again = pools.get(&mut scene, &bullet, &Placement::at(Vec3::new(0.0, 1.0, 0.0)));
//! assert_eq!(first, again);
//! assert_eq!(pools.instance_count(&bullet), 1);
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::AddAssign;
use std::rc::Rc;

use crate::config::PoolConfig;
use crate::foundation::math::Placement;
use crate::pool::dispatch::{dispatch_key, DispatchEntry, ErasedInstances};
use crate::pool::host::{PoolHost, Prototype};
use crate::pool::{PoolContainer, PoolError};

/// Identity of a prototype value
///
/// Derived from the address of the prototype's `Rc` allocation. The registry
/// keeps the `Rc` alive for as long as the entry exists, so a key cannot be
/// reused by a different prototype while its pool is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrototypeKey(usize);

impl PrototypeKey {
    /// Key of a typed prototype
    pub fn of<P: ?Sized>(prototype: &Rc<P>) -> Self {
        Self(Rc::as_ptr(prototype).cast::<()>() as usize)
    }
}

/// Aggregate counters across pools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of prototype pools
    pub prototypes: usize,
    /// Live instances across those pools
    pub instances: usize,
    /// Instances currently retired and waiting for reuse
    pub pooled: usize,
}

impl PoolStats {
    /// Instances currently handed out
    pub const fn active(&self) -> usize {
        self.instances - self.pooled
    }
}

impl AddAssign for PoolStats {
    fn add_assign(&mut self, other: Self) {
        self.prototypes += other.prototypes;
        self.instances += other.instances;
        self.pooled += other.pooled;
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pools, {} instances ({} active, {} pooled)",
            self.prototypes,
            self.instances,
            self.active(),
            self.pooled
        )
    }
}

struct PoolEntry<P: Prototype> {
    /// Pins the prototype so its key stays unique
    prototype: Rc<P>,
    container: Rc<PoolContainer<P::Instance>>,
}

/// All pools for prototypes of type `P`
struct PrototypePools<P: Prototype> {
    entries: HashMap<PrototypeKey, PoolEntry<P>>,
}

impl<P: Prototype> PrototypePools<P> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

/// Type-erased view of a `PrototypePools<P>`
trait ErasedPools {
    fn stats(&self) -> PoolStats;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<P: Prototype> ErasedPools for PrototypePools<P> {
    fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            prototypes: self.entries.len(),
            ..PoolStats::default()
        };
        for entry in self.entries.values() {
            stats.instances += entry.container.instance_count();
            stats.pooled += entry.container.pooled_count();
        }
        stats
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry mapping each prototype to its pool container
///
/// `H` is the host type that creates, places and destroys instances. The
/// registry does not own the host; every call that may touch instances takes
/// it by `&mut`.
pub struct PoolRegistry<H> {
    pools: HashMap<TypeId, Box<dyn ErasedPools>>,
    dispatch: HashMap<TypeId, DispatchEntry<H>>,
    config: PoolConfig,
}

impl<H> PoolRegistry<H> {
    /// Create an empty registry with default settings
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty registry with custom settings
    pub fn with_config(config: PoolConfig) -> Self {
        log::debug!("Creating PoolRegistry with config: {:?}", config);
        Self {
            pools: HashMap::new(),
            dispatch: HashMap::new(),
            config,
        }
    }

    /// Registry settings
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Make prototype type `P` reachable through the erased entry points
    ///
    /// Called implicitly by every typed operation; call it explicitly for
    /// types that are first seen through [`Self::create_instances_dyn`].
    pub fn register_type<P>(&mut self)
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        self.dispatch
            .entry(dispatch_key::<P>())
            .or_insert_with(|| {
                log::debug!("Registered pool dispatch for {}", type_name::<P>());
                DispatchEntry::of::<P>()
            });
    }

    /// Whether prototype type `P` has a dispatch entry
    pub fn is_registered<P: Prototype>(&self) -> bool {
        self.dispatch.contains_key(&dispatch_key::<P>())
    }

    /// Get an instance of `prototype` at `placement`
    ///
    /// Reuses a retired instance of the same prototype when one exists,
    /// otherwise creates a new one.
    pub fn get<P>(&mut self, host: &mut H, prototype: &Rc<P>, placement: &Placement) -> P::Instance
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        self.container(prototype).get_instance(host, &**prototype, placement)
    }

    /// Append `count` instances of `prototype` to `out`
    ///
    /// `out` is never cleared.
    pub fn get_many<P>(
        &mut self,
        host: &mut H,
        out: &mut Vec<P::Instance>,
        count: usize,
        prototype: &Rc<P>,
        placement: &Placement,
    ) where
        P: Prototype,
        H: PoolHost<P>,
    {
        let container = self.container(prototype);
        container.ensure_capacity(container.active_count() + count);
        out.reserve(count);

        for _ in 0..count {
            out.push(container.get_instance(host, &**prototype, placement));
        }
    }

    /// Replace every element of `slots` with an instance of `prototype`
    ///
    /// The previous values are dropped, not retired.
    pub fn fill<P>(&mut self, host: &mut H, slots: &mut [P::Instance], prototype: &Rc<P>, placement: &Placement)
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        let container = self.container(prototype);
        container.ensure_capacity(container.active_count() + slots.len());

        for slot in slots.iter_mut().rev() {
            *slot = container.get_instance(host, &**prototype, placement);
        }
    }

    /// Create instances of `prototype` until `quantity` exist
    ///
    /// Only the shortfall between the current instance count and `quantity`
    /// is created; pooled instances are left alone. New instances are active
    /// at the origin. Returns the instances created by this call.
    pub fn create_instances<P>(
        &mut self,
        host: &mut H,
        prototype: &Rc<P>,
        quantity: usize,
        keep_across_context_reset: bool,
    ) -> Vec<P::Instance>
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        let container = self.container(prototype);
        container.ensure_capacity(quantity);

        let missing = quantity.saturating_sub(container.instance_count());
        let placement = Placement::origin();
        let mut created = Vec::with_capacity(missing);
        for _ in 0..missing {
            let instance = container.create_instance(host, &**prototype, &placement);
            if keep_across_context_reset {
                host.keep_across_context_reset(&instance);
            }
            created.push(instance);
        }

        log::debug!(
            "Created {} of {} requested {} instances",
            created.len(),
            quantity,
            type_name::<P>()
        );
        created
    }

    /// Runtime-typed [`Self::create_instances`]
    ///
    /// Resolves the prototype's concrete type through the dispatch table.
    /// An unregistered type yields [`PoolError::UnresolvedDispatch`] without
    /// touching any pool.
    pub fn create_instances_dyn(
        &mut self,
        host: &mut H,
        prototype: Rc<dyn Any>,
        quantity: usize,
        keep_across_context_reset: bool,
    ) -> Result<ErasedInstances, PoolError> {
        let entry = self.dispatch_entry((*prototype).type_id())?;
        (entry.create_instances)(self, host, prototype, quantity, keep_across_context_reset)
    }

    /// Destroy every instance of every prototype of type `P`
    ///
    /// Their pools are removed from the registry.
    pub fn destroy_instances<P>(&mut self, host: &mut H)
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        let Some(pools) = self.pools.remove(&TypeId::of::<P>()) else {
            return;
        };
        let pools = Self::downcast::<P>(pools.as_any());

        for entry in pools.entries.values() {
            entry.container.destroy_instances::<P, H>(host);
        }
        log::debug!("Destroyed {} {} pools", pools.entries.len(), type_name::<P>());
    }

    /// Destroy the instances of one prototype only
    ///
    /// Other prototypes of the same type keep their pools.
    pub fn destroy_prototype_instances<P>(&mut self, host: &mut H, prototype: &Rc<P>)
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        let removed = self
            .pools_mut::<P>()
            .and_then(|pools| pools.entries.remove(&PrototypeKey::of(prototype)));

        if let Some(entry) = removed {
            entry.container.destroy_instances::<P, H>(host);
            log::debug!("Destroyed pool for one {} prototype", type_name::<P>());
        }
    }

    /// Runtime-typed [`Self::destroy_instances`], keyed by prototype type
    pub fn destroy_instances_dyn(&mut self, host: &mut H, prototype_type: TypeId) -> Result<(), PoolError> {
        let entry = self.dispatch_entry(prototype_type)?;
        (entry.destroy_instances)(self, host);
        Ok(())
    }

    /// Deactivate an erased instance produced from a prototype of `prototype_type`
    pub fn deactivate_dyn(&self, host: &mut H, prototype_type: TypeId, instance: &dyn Any) -> Result<(), PoolError> {
        let entry = self.dispatch_entry(prototype_type)?;
        (entry.deactivate)(host, instance)
    }

    /// Container serving `prototype`, if one has been created
    pub fn container_for<P: Prototype>(&self, prototype: &Rc<P>) -> Option<Rc<PoolContainer<P::Instance>>> {
        self.pools_ref::<P>()
            .and_then(|pools| pools.entries.get(&PrototypeKey::of(prototype)))
            .map(|entry| Rc::clone(&entry.container))
    }

    /// Live instances of `prototype` (0 when it has no pool)
    pub fn instance_count<P: Prototype>(&self, prototype: &Rc<P>) -> usize {
        self.container_for(prototype)
            .map_or(0, |container| container.instance_count())
    }

    /// Retired instances of `prototype` waiting for reuse
    pub fn pooled_count<P: Prototype>(&self, prototype: &Rc<P>) -> usize {
        self.container_for(prototype)
            .map_or(0, |container| container.pooled_count())
    }

    /// Prototypes of type `P` that currently have a pool
    pub fn prototypes<P: Prototype>(&self) -> Vec<Rc<P>> {
        self.pools_ref::<P>()
            .map(|pools| pools.entries.values().map(|entry| Rc::clone(&entry.prototype)).collect())
            .unwrap_or_default()
    }

    /// Counters summed over every pool
    pub fn stats(&self) -> PoolStats {
        let mut total = PoolStats::default();
        for pools in self.pools.values() {
            total += pools.stats();
        }
        total
    }

    /// Tear down every pool of every registered prototype type
    pub fn shutdown(mut self, host: &mut H) {
        let stats = self.stats();
        let entries: Vec<DispatchEntry<H>> = self.dispatch.values().copied().collect();
        for entry in entries {
            (entry.destroy_instances)(&mut self, host);
        }
        log::info!("Pool registry shut down ({})", stats);
    }

    /// Get or lazily create the container for `prototype`
    fn container<P>(&mut self, prototype: &Rc<P>) -> Rc<PoolContainer<P::Instance>>
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        self.register_type::<P>();

        let capacity = self.config.default_capacity;
        let pools = self
            .pools
            .entry(TypeId::of::<P>())
            .or_insert_with(|| Box::new(PrototypePools::<P>::new()) as Box<dyn ErasedPools>);
        let pools = Self::downcast_mut::<P>(pools.as_any_mut());

        let entry = pools
            .entries
            .entry(PrototypeKey::of(prototype))
            .or_insert_with(|| {
                log::debug!("Creating pool container for a new {} prototype", type_name::<P>());
                PoolEntry {
                    prototype: Rc::clone(prototype),
                    container: PoolContainer::with_capacity(capacity),
                }
            });
        Rc::clone(&entry.container)
    }

    fn pools_ref<P: Prototype>(&self) -> Option<&PrototypePools<P>> {
        self.pools
            .get(&TypeId::of::<P>())
            .map(|pools| Self::downcast::<P>(pools.as_any()))
    }

    fn pools_mut<P: Prototype>(&mut self) -> Option<&mut PrototypePools<P>> {
        self.pools
            .get_mut(&TypeId::of::<P>())
            .map(|pools| Self::downcast_mut::<P>(pools.as_any_mut()))
    }

    fn downcast<P: Prototype>(pools: &dyn Any) -> &PrototypePools<P> {
        pools
            .downcast_ref::<PrototypePools<P>>()
            .expect("Pools should be stored under their own TypeId")
    }

    fn downcast_mut<P: Prototype>(pools: &mut dyn Any) -> &mut PrototypePools<P> {
        pools
            .downcast_mut::<PrototypePools<P>>()
            .expect("Pools should be stored under their own TypeId")
    }

    fn dispatch_entry(&self, prototype_type: TypeId) -> Result<DispatchEntry<H>, PoolError> {
        self.dispatch.get(&prototype_type).copied().ok_or_else(|| {
            log::error!("No pool dispatch registered for prototype type {:?}", prototype_type);
            PoolError::UnresolvedDispatch { type_id: prototype_type }
        })
    }
}

impl<H> Default for PoolRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for PoolRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<&str> = self.dispatch.values().map(|entry| entry.type_name).collect();
        f.debug_struct("PoolRegistry")
            .field("registered", &registered)
            .field("stats", &self.stats())
            .finish()
    }
}
