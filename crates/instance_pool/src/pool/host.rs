//! Host collaborator contracts
//!
//! The pool never creates, moves or destroys engine objects on its own. It
//! talks to the host through two seams:
//!
//! - [`ResourceFactory`]: instantiate a prototype, attach a tracker, dispose
//! - [`PlacementService`]: position/parent an instance and toggle it
//!
//! # Lifecycle signal contract
//!
//! A host that hands a [`LifecycleTracker`] to an instance must report:
//!
//! - `on_disabled` when the instance goes from active to inactive
//! - `on_enabled` when the instance goes from inactive to active
//! - `on_destroyed` when the instance is destroyed, preceded by `on_disabled`
//!   if it was still active
//!
//! Signals fire only on real transitions and in the order they happen.
//! Delivering them re-entrantly from inside `activate`, `deactivate` or
//! `destroy` is fine; the pool holds no borrows across those calls.

use std::rc::Rc;

use crate::foundation::math::Placement;
use crate::pool::LifecycleTracker;

/// Template that pooled instances are cloned from
///
/// The prototype value's identity (not its contents) selects the pool.
pub trait Prototype: 'static {
    /// Handle to an instance produced from this prototype
    type Instance: Clone + 'static;
}

/// Creates and disposes instances of prototype `P`
pub trait ResourceFactory<P: Prototype> {
    /// Produce a new, active, independent instance at `placement`
    fn instantiate(&mut self, prototype: &P, placement: &Placement) -> P::Instance;

    /// Attach the lifecycle tracker that the host must report transitions to
    fn attach_tracker(&mut self, instance: &P::Instance, tracker: Rc<LifecycleTracker>);

    /// Dispose an instance permanently
    fn destroy(&mut self, instance: P::Instance);

    /// Let `instance` survive the host's next context reset
    fn keep_across_context_reset(&mut self, _instance: &P::Instance) {}
}

/// Moves instances into place and toggles them
pub trait PlacementService<T> {
    /// Apply position, rotation and parent, then make the instance active
    fn activate(&mut self, instance: &T, placement: &Placement);

    /// Make the instance inactive, which retires it into its pool
    fn deactivate(&mut self, instance: &T);
}

/// Everything the pool needs from a host for prototype `P`
pub trait PoolHost<P: Prototype>: ResourceFactory<P> + PlacementService<P::Instance> {}

impl<P, H> PoolHost<P> for H
where
    P: Prototype,
    H: ResourceFactory<P> + PlacementService<P::Instance>,
{
}
