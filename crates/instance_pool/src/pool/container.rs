//! Pool Container
//!
//! Holds every instance ever created for one prototype in a single dense
//! array, partitioned by a counter instead of a second collection:
//!
//! ```text
//! index:   0         len - pool_count        len
//!          |---- active ----|---- pooled ----|
//! ```
//!
//! # Performance Characteristics
//!
//! - **Get**: O(1), the first pooled slot already sits on the boundary
//! - **Retire / Reclaim**: O(1), one swap across the boundary
//! - **Destroy**: O(1), swap-remove with the last slot
//! - **Create**: O(1) amortized plus whatever the host's instantiate costs
//!
//! Each pair's [`LifecycleTracker`] stores the pair's current slot. The
//! container is the only writer of those indices and fixes them up on every
//! swap, so a tracker's index always equals its physical position.

use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::DEFAULT_CONTAINER_CAPACITY;
use crate::foundation::math::Placement;
use crate::pool::host::{PlacementService, PoolHost, Prototype, ResourceFactory};
use crate::pool::{LifecycleTracker, PoolObjectManager};

/// Dense (tracker, instance) storage plus the pooled-segment length
struct Slots<T> {
    instances: Vec<(Rc<LifecycleTracker>, T)>,
    pool_count: usize,
}

impl<T> Slots<T> {
    /// First pooled slot, equal to the number of active instances
    fn boundary(&self) -> usize {
        self.instances.len() - self.pool_count
    }

    fn swap(&mut self, x: usize, y: usize) {
        if x == y {
            return;
        }

        self.instances.swap(x, y);
        self.instances[x].0.set_index(x);
        self.instances[y].0.set_index(y);
    }
}

/// Pool of instances produced from a single prototype
///
/// Always lives behind an `Rc`: trackers hold a `Weak` back-reference to it
/// as their [`PoolObjectManager`].
pub struct PoolContainer<T> {
    slots: RefCell<Slots<T>>,
    self_ref: Weak<PoolContainer<T>>,
}

impl<T: Clone + 'static> PoolContainer<T> {
    /// Create an empty container with the default capacity
    pub fn new() -> Rc<Self> {
        Self::with_capacity(DEFAULT_CONTAINER_CAPACITY)
    }

    /// Create an empty container with room for `capacity` instances
    pub fn with_capacity(capacity: usize) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            slots: RefCell::new(Slots {
                instances: Vec::with_capacity(capacity),
                pool_count: 0,
            }),
            self_ref: self_ref.clone(),
        })
    }

    /// Total number of live instances created by this container
    pub fn instance_count(&self) -> usize {
        self.slots.borrow().instances.len()
    }

    /// Number of retired instances waiting to be reused
    pub fn pooled_count(&self) -> usize {
        self.slots.borrow().pool_count
    }

    /// Number of instances currently handed out
    pub fn active_count(&self) -> usize {
        self.slots.borrow().boundary()
    }

    /// Current backing capacity
    pub fn capacity(&self) -> usize {
        self.slots.borrow().instances.capacity()
    }

    /// Grow the backing storage to hold at least `capacity` instances
    ///
    /// Never shrinks; purely an allocation hint.
    pub fn ensure_capacity(&self, capacity: usize) {
        let mut slots = self.slots.borrow_mut();
        if slots.instances.capacity() < capacity {
            let additional = capacity - slots.instances.len();
            slots.instances.reserve_exact(additional);
        }
    }

    /// Get an instance of `prototype`, reusing a pooled one when available
    ///
    /// A reused instance is moved to `placement` and activated through the
    /// host. When nothing is pooled a new instance is created.
    pub fn get_instance<P, H>(&self, host: &mut H, prototype: &P, placement: &Placement) -> T
    where
        P: Prototype<Instance = T>,
        H: PoolHost<P> + ?Sized,
    {
        let reclaimed = {
            let mut slots = self.slots.borrow_mut();
            if slots.pool_count == 0 {
                None
            } else {
                // The first pooled slot becomes the last active one as-is.
                let index = slots.boundary();
                slots.pool_count -= 1;
                let (tracker, instance) = &slots.instances[index];
                Some((Rc::clone(tracker), instance.clone()))
            }
        };

        match reclaimed {
            Some((tracker, instance)) => {
                log::trace!("Reusing pooled {} at slot {}", type_name::<T>(), tracker.index());
                tracker.activate_with(|| host.activate(&instance, placement));
                instance
            }
            None => self.create_instance(host, prototype, placement),
        }
    }

    /// Create a brand new instance of `prototype` owned by this container
    ///
    /// The only operation that grows the container.
    pub fn create_instance<P, H>(&self, host: &mut H, prototype: &P, placement: &Placement) -> T
    where
        P: Prototype<Instance = T>,
        H: ResourceFactory<P> + ?Sized,
    {
        let instance = host.instantiate(prototype, placement);

        let tracker = LifecycleTracker::new();
        let manager: Weak<dyn PoolObjectManager> = self.self_ref.clone();
        tracker.set_manager(manager);

        let index = {
            let mut slots = self.slots.borrow_mut();
            let index = slots.instances.len();
            tracker.set_index(index);
            slots.instances.push((Rc::clone(&tracker), instance.clone()));
            index
        };

        host.attach_tracker(&instance, tracker);
        log::trace!("Created {} at slot {}", type_name::<T>(), index);
        instance
    }

    /// Permanently destroy every instance this container created
    ///
    /// Active and pooled instances alike. Trackers are detached first so the
    /// host's destroy signals for these instances are ignored.
    pub fn destroy_instances<P, H>(&self, host: &mut H)
    where
        P: Prototype<Instance = T>,
        H: ResourceFactory<P> + ?Sized,
    {
        let drained: Vec<_> = {
            let mut slots = self.slots.borrow_mut();
            slots.pool_count = 0;
            slots.instances.drain(..).collect()
        };

        for (tracker, _) in &drained {
            tracker.detach();
        }

        let count = drained.len();
        for (_, instance) in drained {
            host.destroy(instance);
        }

        if count > 0 {
            log::debug!("Destroyed {} pooled {} instances", count, type_name::<T>());
        }
    }

    /// Snapshot of every instance, active segment first
    pub fn instances(&self) -> Vec<T> {
        self.slots
            .borrow()
            .instances
            .iter()
            .map(|(_, instance)| instance.clone())
            .collect()
    }

    /// Snapshot of the pooled segment
    pub fn pooled_instances(&self) -> Vec<T> {
        let slots = self.slots.borrow();
        slots.instances[slots.boundary()..]
            .iter()
            .map(|(_, instance)| instance.clone())
            .collect()
    }

    /// Snapshot of every tracker in slot order
    pub fn trackers(&self) -> Vec<Rc<LifecycleTracker>> {
        self.slots
            .borrow()
            .instances
            .iter()
            .map(|(tracker, _)| Rc::clone(tracker))
            .collect()
    }

    /// Check that every tracker's index matches its slot
    pub fn indices_consistent(&self) -> bool {
        self.trackers()
            .iter()
            .enumerate()
            .all(|(slot, tracker)| tracker.index() == slot)
    }
}

impl<T: 'static> PoolObjectManager for PoolContainer<T> {
    fn pool(&self, tracker: &LifecycleTracker) {
        let mut slots = self.slots.borrow_mut();
        slots.pool_count += 1;
        debug_assert!(
            slots.pool_count <= slots.instances.len(),
            "retired more instances than the container holds"
        );

        let target = slots.boundary();
        slots.swap(tracker.index(), target);
        log::trace!("Pooled {} into slot {}", type_name::<T>(), target);
    }

    fn un_pool(&self, tracker: &LifecycleTracker) {
        let mut slots = self.slots.borrow_mut();
        let boundary = slots.boundary();
        debug_assert!(
            tracker.index() >= boundary,
            "reclaimed an instance that is already active"
        );

        slots.swap(tracker.index(), boundary);
        slots.pool_count -= 1;
        log::trace!("Un-pooled {} into slot {}", type_name::<T>(), boundary);
    }

    fn destroy(&self, tracker: &LifecycleTracker) {
        let removed = {
            let mut slots = self.slots.borrow_mut();
            // The host disables before destroying, so this pair is pooled.
            slots.pool_count -= 1;

            let index = tracker.index();
            let removed = slots.instances.swap_remove(index);
            if let Some((moved, _)) = slots.instances.get(index) {
                moved.set_index(index);
            }
            removed
        };
        log::trace!("Removed destroyed {} from slot {}", type_name::<T>(), removed.0.index());
    }
}

impl<T> fmt::Debug for PoolContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        f.debug_struct("PoolContainer")
            .field("type", &type_name::<T>())
            .field("instances", &slots.instances.len())
            .field("pooled", &slots.pool_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use std::collections::HashMap;

    struct Token;

    impl Prototype for Token {
        type Instance = u32;
    }

    /// Host that records calls; lifecycle hooks are fired by hand
    #[derive(Default)]
    struct FakeHost {
        next_id: u32,
        trackers: HashMap<u32, Rc<LifecycleTracker>>,
        activated: Vec<(u32, Placement)>,
        destroyed: Vec<u32>,
    }

    impl FakeHost {
        fn tracker(&self, id: u32) -> Rc<LifecycleTracker> {
            Rc::clone(&self.trackers[&id])
        }

        fn disable(&self, id: u32) {
            self.tracker(id).on_disabled();
        }

        fn enable(&self, id: u32) {
            self.tracker(id).on_enabled();
        }
    }

    impl ResourceFactory<Token> for FakeHost {
        fn instantiate(&mut self, _prototype: &Token, _placement: &Placement) -> u32 {
            self.next_id += 1;
            self.next_id
        }

        fn attach_tracker(&mut self, instance: &u32, tracker: Rc<LifecycleTracker>) {
            self.trackers.insert(*instance, tracker);
        }

        fn destroy(&mut self, instance: u32) {
            self.destroyed.push(instance);
        }
    }

    impl PlacementService<u32> for FakeHost {
        fn activate(&mut self, instance: &u32, placement: &Placement) {
            self.activated.push((*instance, *placement));
        }

        fn deactivate(&mut self, instance: &u32) {
            self.disable(*instance);
        }
    }

    fn get(container: &PoolContainer<u32>, host: &mut FakeHost) -> u32 {
        container.get_instance(host, &Token, &Placement::origin())
    }

    /// Host that keeps a single instance active, retiring the others from
    /// inside `activate`
    #[derive(Default)]
    struct ExclusiveHost {
        inner: FakeHost,
        active: Vec<u32>,
    }

    impl ExclusiveHost {
        fn disable(&mut self, id: u32) {
            self.active.retain(|active| *active != id);
            self.inner.disable(id);
        }
    }

    impl ResourceFactory<Token> for ExclusiveHost {
        fn instantiate(&mut self, prototype: &Token, placement: &Placement) -> u32 {
            let id = self.inner.instantiate(prototype, placement);
            self.active.push(id);
            id
        }

        fn attach_tracker(&mut self, instance: &u32, tracker: Rc<LifecycleTracker>) {
            self.inner.attach_tracker(instance, tracker);
        }

        fn destroy(&mut self, instance: u32) {
            self.inner.destroy(instance);
        }
    }

    impl PlacementService<u32> for ExclusiveHost {
        fn activate(&mut self, instance: &u32, _placement: &Placement) {
            let others: Vec<u32> = self.active.iter().copied().filter(|id| id != instance).collect();
            for other in others {
                self.disable(other);
            }
            self.active.push(*instance);
            self.inner.enable(*instance);
        }

        fn deactivate(&mut self, instance: &u32) {
            self.disable(*instance);
        }
    }

    #[test]
    fn test_get_instance_creates_when_empty() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();

        let first = get(&container, &mut host);
        let second = get(&container, &mut host);

        assert_ne!(first, second);
        assert_eq!(container.instance_count(), 2);
        assert_eq!(container.active_count(), 2);
        assert_eq!(container.pooled_count(), 0);
        assert!(host.activated.is_empty());
    }

    #[test]
    fn test_retired_instance_is_reused_and_placed() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();

        let first = get(&container, &mut host);
        let _second = get(&container, &mut host);
        host.disable(first);
        assert_eq!(container.pooled_count(), 1);

        let placement = Placement::at(Vec3::new(5.0, -10.0, 10.0));
        let reused = container.get_instance(&mut host, &Token, &placement);

        assert_eq!(reused, first);
        assert_eq!(container.instance_count(), 2);
        assert_eq!(container.pooled_count(), 0);
        assert_eq!(host.activated, vec![(first, placement)]);
        assert!(container.indices_consistent());
    }

    #[test]
    fn test_host_may_retire_others_during_activate() {
        let container = PoolContainer::<u32>::new();
        let mut host = ExclusiveHost::default();
        let a = container.get_instance(&mut host, &Token, &Placement::origin());
        let b = container.get_instance(&mut host, &Token, &Placement::origin());
        host.disable(a);

        let reused = container.get_instance(&mut host, &Token, &Placement::origin());

        assert_eq!(reused, a);
        assert_eq!(host.active, vec![a]);
        assert_eq!(container.pooled_instances(), vec![b]);
        assert_eq!(container.active_count(), 1);
        assert_eq!(container.pooled_count(), 1);
        assert_eq!(container.instance_count(), 2);
        assert!(container.indices_consistent());
    }

    #[test]
    fn test_pool_swaps_into_pooled_segment() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let ids: Vec<u32> = (0..4).map(|_| get(&container, &mut host)).collect();

        // Retiring from the middle of the active segment.
        host.disable(ids[1]);

        assert_eq!(container.pooled_instances(), vec![ids[1]]);
        assert_eq!(host.tracker(ids[1]).index(), 3);
        assert_eq!(host.tracker(ids[3]).index(), 1);
        assert!(container.indices_consistent());
    }

    #[test]
    fn test_un_pool_is_inverse_of_pool() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let ids: Vec<u32> = (0..3).map(|_| get(&container, &mut host)).collect();

        host.disable(ids[0]);
        assert_eq!(container.pooled_instances(), vec![ids[0]]);
        host.enable(ids[0]);

        assert_eq!(container.pooled_count(), 0);
        assert_eq!(container.active_count(), 3);
        assert!(container.pooled_instances().is_empty());
        assert!(container.indices_consistent());
        assert!(container.trackers().iter().all(|tracker| tracker.is_managed()));
    }

    #[test]
    fn test_un_pool_from_middle_of_pooled_segment() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let ids: Vec<u32> = (0..3).map(|_| get(&container, &mut host)).collect();
        for id in &ids {
            host.disable(*id);
        }

        host.enable(ids[1]);

        assert_eq!(container.pooled_count(), 2);
        assert!(!container.pooled_instances().contains(&ids[1]));
        assert!(container.indices_consistent());

        let a = get(&container, &mut host);
        let b = get(&container, &mut host);
        assert_ne!(a, ids[1]);
        assert_ne!(b, ids[1]);
        assert_ne!(a, b);
        assert_eq!(container.instance_count(), 3);
    }

    #[test]
    fn test_destroy_swap_removes_pair() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let ids: Vec<u32> = (0..5).map(|_| get(&container, &mut host)).collect();
        host.disable(ids[4]);
        host.disable(ids[3]);

        // Host protocol: disable, then destroy.
        host.disable(ids[0]);
        host.tracker(ids[0]).on_destroyed();

        assert_eq!(container.instance_count(), 4);
        assert_eq!(container.pooled_count(), 2);
        assert!(!container.instances().contains(&ids[0]));
        assert!(container.indices_consistent());
    }

    #[test]
    fn test_destroy_last_slot() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let only = get(&container, &mut host);

        host.disable(only);
        host.tracker(only).on_destroyed();

        assert_eq!(container.instance_count(), 0);
        assert_eq!(container.pooled_count(), 0);
    }

    #[test]
    fn test_destroy_instances_disposes_everything() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let ids: Vec<u32> = (0..5).map(|_| get(&container, &mut host)).collect();
        for id in &ids[2..] {
            host.disable(*id);
        }

        container.destroy_instances::<Token, _>(&mut host);

        assert_eq!(container.instance_count(), 0);
        assert_eq!(container.pooled_count(), 0);
        let mut destroyed = host.destroyed.clone();
        destroyed.sort_unstable();
        assert_eq!(destroyed, ids);

        // Late host signals for torn down instances are ignored.
        for id in &ids {
            assert!(!host.tracker(*id).is_managed());
            host.tracker(*id).on_destroyed();
        }
        assert_eq!(container.instance_count(), 0);
    }

    #[test]
    fn test_ensure_capacity_never_shrinks() {
        let container = PoolContainer::<u32>::with_capacity(4);
        container.ensure_capacity(64);
        assert!(container.capacity() >= 64);

        let before = container.capacity();
        container.ensure_capacity(2);
        assert_eq!(container.capacity(), before);
    }

    #[test]
    fn test_dropped_container_leaves_trackers_inert() {
        let container = PoolContainer::<u32>::new();
        let mut host = FakeHost::default();
        let id = get(&container, &mut host);
        drop(container);

        let tracker = host.tracker(id);
        assert!(!tracker.is_managed());
        tracker.on_disabled();
    }
}
