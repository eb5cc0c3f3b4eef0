//! Reference scene host
//!
//! A minimal object hierarchy that plays the host role for the pool: it
//! instantiates prefabs, places and toggles objects and destroys them, and
//! reports every real state transition to the object's [`LifecycleTracker`].
//!
//! An object is active in the hierarchy only while its own flag and every
//! ancestor's flag are set. Signals follow that effective state and are
//! delivered only on actual transitions:
//!
//! - [`Scene::set_active`] fires `on_enabled`/`on_disabled` for the object
//!   and every descendant whose effective state flips with it
//! - [`Scene::destroy`] disables the subtree first, then fires
//!   `on_destroyed` for the object and each of its descendants
//!
//! Enabling a parent again re-enables descendants whose own flag is still
//! set. A pooled child retired through its own flag stays pooled.

pub mod object;
pub mod prefab;

pub use object::{ObjectFlags, ObjectHandle, SceneObject};
pub use prefab::Prefab;

use std::rc::Rc;

use slotmap::SlotMap;

use crate::foundation::math::{Placement, Quat, Vec3};
use crate::pool::{LifecycleTracker, PlacementService, ResourceFactory};

/// Object hierarchy that hosts pooled instances
#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<ObjectHandle, SceneObject>,
    instantiated: usize,
    destroyed: usize,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a plain, unpooled object
    pub fn spawn(&mut self, name: impl Into<String>, placement: &Placement) -> ObjectHandle {
        let handle = self.objects.insert(SceneObject::new(name, placement));
        self.reparent(handle, placement.parent);
        self.instantiated += 1;
        handle
    }

    /// Borrow an object
    pub fn get(&self, handle: ObjectHandle) -> Option<&SceneObject> {
        self.objects.get(handle)
    }

    /// Mutably borrow an object
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut SceneObject> {
        self.objects.get_mut(handle)
    }

    /// Whether `handle` refers to a live object
    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(handle)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `handle` is live and active in the hierarchy
    pub fn is_active(&self, handle: ObjectHandle) -> bool {
        let mut current = Some(handle);
        while let Some(handle) = current {
            match self.objects.get(handle) {
                Some(object) if object.is_active() => current = object.parent,
                _ => return false,
            }
        }
        true
    }

    /// Whether `handle` is live and its own active flag is set
    pub fn is_active_self(&self, handle: ObjectHandle) -> bool {
        self.objects.get(handle).is_some_and(SceneObject::is_active)
    }

    /// Local position of a live object
    pub fn position(&self, handle: ObjectHandle) -> Option<Vec3> {
        self.objects.get(handle).map(|object| object.position)
    }

    /// Local rotation of a live object
    pub fn rotation(&self, handle: ObjectHandle) -> Option<Quat> {
        self.objects.get(handle).map(|object| object.rotation)
    }

    /// Parent of a live object
    pub fn parent(&self, handle: ObjectHandle) -> Option<ObjectHandle> {
        self.objects.get(handle).and_then(SceneObject::parent)
    }

    /// Number of live objects active in the hierarchy
    pub fn active_count(&self) -> usize {
        self.objects.keys().filter(|handle| self.is_active(*handle)).count()
    }

    /// Objects ever created by this scene
    pub const fn instantiated_count(&self) -> usize {
        self.instantiated
    }

    /// Objects ever destroyed by this scene
    pub const fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// Attach the lifecycle tracker that receives this object's transitions
    pub fn set_tracker(&mut self, handle: ObjectHandle, tracker: Rc<LifecycleTracker>) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.tracker = Some(tracker);
        }
    }

    /// Let an object survive [`Self::reset_context`]
    pub fn mark_persistent(&mut self, handle: ObjectHandle) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.flags.insert(ObjectFlags::PERSISTENT);
        }
    }

    /// Set or clear an object's own active flag
    ///
    /// Returns whether the flag changed. Trackers are notified only where the
    /// effective state changes, which includes descendants of `handle`.
    pub fn set_active(&mut self, handle: ObjectHandle, active: bool) -> bool {
        let was_active = self.is_active(handle);
        let Some(object) = self.objects.get_mut(handle) else {
            return false;
        };
        if object.is_active() == active {
            return false;
        }

        object.flags.set(ObjectFlags::ACTIVE, active);
        if self.is_active(handle) != was_active {
            self.notify_subtree(handle, active);
        }
        true
    }

    /// Destroy an object and everything parented under it
    pub fn destroy(&mut self, handle: ObjectHandle) {
        if !self.objects.contains_key(handle) {
            return;
        }

        self.set_active(handle, false);
        self.reparent(handle, None);
        self.remove_subtree(handle);
    }

    /// Unload the current context
    ///
    /// Destroys every root object not marked persistent, along with its
    /// children. Returns the number of objects destroyed.
    pub fn reset_context(&mut self) -> usize {
        let before = self.destroyed;
        let doomed: Vec<ObjectHandle> = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent.is_none() && !object.flags.contains(ObjectFlags::PERSISTENT))
            .map(|(handle, _)| handle)
            .collect();

        for handle in doomed {
            self.destroy(handle);
        }

        let destroyed = self.destroyed - before;
        log::debug!("Context reset destroyed {} objects", destroyed);
        destroyed
    }

    /// Fire `on_enabled`/`on_disabled` for `root` and every descendant that
    /// follows its effective state
    fn notify_subtree(&self, root: ObjectHandle, active: bool) {
        let mut trackers = Vec::new();
        let mut pending = vec![root];
        while let Some(handle) = pending.pop() {
            let Some(object) = self.objects.get(handle) else {
                continue;
            };
            // A child with its own flag cleared is inactive either way
            if handle != root && !object.is_active() {
                continue;
            }
            trackers.extend(object.tracker.clone());
            pending.extend(object.children.iter().rev().copied());
        }

        for tracker in trackers {
            if active {
                tracker.on_enabled();
            } else {
                tracker.on_disabled();
            }
        }
    }

    /// Remove an already disabled subtree, reporting each destruction
    fn remove_subtree(&mut self, handle: ObjectHandle) {
        let Some(object) = self.objects.remove(handle) else {
            return;
        };
        self.destroyed += 1;
        if let Some(tracker) = &object.tracker {
            tracker.on_destroyed();
        }

        for child in object.children {
            self.remove_subtree(child);
        }
    }

    fn apply_placement(&mut self, handle: ObjectHandle, placement: &Placement) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.position = placement.position + object.pivot;
            object.rotation = placement.rotation;
        }
        self.reparent(handle, placement.parent);
    }

    fn reparent(&mut self, handle: ObjectHandle, parent: Option<ObjectHandle>) {
        let parent = parent.filter(|parent| *parent != handle && self.objects.contains_key(*parent));
        let was_active = self.is_active(handle);
        let Some(object) = self.objects.get_mut(handle) else {
            return;
        };
        let previous = std::mem::replace(&mut object.parent, parent);
        if previous == parent {
            return;
        }

        if let Some(previous) = previous.and_then(|previous| self.objects.get_mut(previous)) {
            previous.children.retain(|child| *child != handle);
        }
        if let Some(parent) = parent.and_then(|parent| self.objects.get_mut(parent)) {
            parent.children.push(handle);
        }

        let now_active = self.is_active(handle);
        if now_active != was_active {
            self.notify_subtree(handle, now_active);
        }
    }
}

impl ResourceFactory<Prefab> for Scene {
    fn instantiate(&mut self, prototype: &Prefab, placement: &Placement) -> ObjectHandle {
        let handle = self.spawn(prototype.name(), placement);
        if let Some(object) = self.objects.get_mut(handle) {
            object.pivot = prototype.pivot;
            object.position += prototype.pivot;
        }
        handle
    }

    fn attach_tracker(&mut self, instance: &ObjectHandle, tracker: Rc<LifecycleTracker>) {
        self.set_tracker(*instance, tracker);
    }

    fn destroy(&mut self, instance: ObjectHandle) {
        Self::destroy(self, instance);
    }

    fn keep_across_context_reset(&mut self, instance: &ObjectHandle) {
        self.mark_persistent(*instance);
    }
}

impl PlacementService<ObjectHandle> for Scene {
    fn activate(&mut self, instance: &ObjectHandle, placement: &Placement) {
        self.apply_placement(*instance, placement);
        self.set_active(*instance, true);
    }

    fn deactivate(&mut self, instance: &ObjectHandle) {
        self.set_active(*instance, false);
    }
}
