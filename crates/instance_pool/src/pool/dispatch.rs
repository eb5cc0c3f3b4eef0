//! Type-erased dispatch into the generic registry API
//!
//! Callers that only hold an `Rc<dyn Any>` prototype (configuration driven
//! pre-warming, editor tooling) cannot name `P`. Each concrete prototype type
//! gets one [`DispatchEntry`] built the first time the registry sees it; the
//! entry's function pointers are monomorphized calls into the generic API.

use std::any::{type_name, Any, TypeId};
use std::rc::Rc;

use crate::pool::host::{PoolHost, Prototype};
use crate::pool::{PoolError, PoolRegistry};

/// Instances created through the erased path, boxed per instance
pub type ErasedInstances = Vec<Box<dyn Any>>;

type CreateFn<H> = fn(&mut PoolRegistry<H>, &mut H, Rc<dyn Any>, usize, bool) -> Result<ErasedInstances, PoolError>;
type DestroyFn<H> = fn(&mut PoolRegistry<H>, &mut H);
type DeactivateFn<H> = fn(&mut H, &dyn Any) -> Result<(), PoolError>;

/// Per-type table of erased pool operations
pub(crate) struct DispatchEntry<H> {
    pub(crate) type_name: &'static str,
    pub(crate) create_instances: CreateFn<H>,
    pub(crate) destroy_instances: DestroyFn<H>,
    pub(crate) deactivate: DeactivateFn<H>,
}

impl<H> Clone for DispatchEntry<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for DispatchEntry<H> {}

impl<H> DispatchEntry<H> {
    /// Build the entry for prototype type `P`
    pub(crate) fn of<P>() -> Self
    where
        P: Prototype,
        H: PoolHost<P>,
    {
        Self {
            type_name: type_name::<P>(),
            create_instances: create_instances_erased::<P, H>,
            destroy_instances: destroy_instances_erased::<P, H>,
            deactivate: deactivate_erased::<P, H>,
        }
    }
}

fn create_instances_erased<P, H>(
    registry: &mut PoolRegistry<H>,
    host: &mut H,
    prototype: Rc<dyn Any>,
    quantity: usize,
    keep_across_context_reset: bool,
) -> Result<ErasedInstances, PoolError>
where
    P: Prototype,
    H: PoolHost<P>,
{
    // Entries are looked up by the prototype's own TypeId
    let prototype = prototype
        .downcast::<P>()
        .expect("Dispatch entry should match its prototype's type");

    Ok(registry
        .create_instances(host, &prototype, quantity, keep_across_context_reset)
        .into_iter()
        .map(|instance| Box::new(instance) as Box<dyn Any>)
        .collect())
}

fn destroy_instances_erased<P, H>(registry: &mut PoolRegistry<H>, host: &mut H)
where
    P: Prototype,
    H: PoolHost<P>,
{
    registry.destroy_instances::<P>(host);
}

fn deactivate_erased<P, H>(host: &mut H, instance: &dyn Any) -> Result<(), PoolError>
where
    P: Prototype,
    H: PoolHost<P>,
{
    let instance = instance
        .downcast_ref::<P::Instance>()
        .ok_or(PoolError::InstanceTypeMismatch { expected: type_name::<P::Instance>() })?;
    host.deactivate(instance);
    Ok(())
}

/// Key a dispatch entry is stored under
pub(crate) fn dispatch_key<P: Prototype>() -> TypeId {
    TypeId::of::<P>()
}
