//! Lifecycle tracker attached to every pooled instance
//!
//! The host runtime owns the instance and decides when it is enabled,
//! disabled or destroyed. It reports those transitions by calling into the
//! instance's [`LifecycleTracker`], which forwards them to whichever
//! [`PoolObjectManager`] currently claims it:
//!
//! ```text
//! host disables instance  -> on_disabled()  -> manager.pool()
//! host enables instance   -> on_enabled()   -> manager.un_pool()
//! host destroys instance  -> on_destroyed() -> manager.destroy()
//! ```
//!
//! A tracker that no container has claimed yet (or that was detached during
//! teardown) points at a detached manager and silently drops notifications.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Receiver of the three lifecycle notifications a tracker forwards
///
/// Implemented by the pool container. All three receive the tracker so the
/// manager can read its current slot index.
pub trait PoolObjectManager {
    /// Instance just became inactive and should join the pooled segment
    fn pool(&self, tracker: &LifecycleTracker);

    /// Instance became active without going through the pool API
    fn un_pool(&self, tracker: &LifecycleTracker);

    /// Instance is being permanently removed by the host
    fn destroy(&self, tracker: &LifecycleTracker);
}

/// Manager used before a container claims a tracker; it never upgrades
#[allow(dead_code)] // Only ever referenced through an empty `Weak`
struct Detached;

impl PoolObjectManager for Detached {
    fn pool(&self, _tracker: &LifecycleTracker) {}
    fn un_pool(&self, _tracker: &LifecycleTracker) {}
    fn destroy(&self, _tracker: &LifecycleTracker) {}
}

fn detached() -> Weak<dyn PoolObjectManager> {
    Weak::<Detached>::new()
}

/// Per-instance record of its slot index plus a link to its manager
///
/// Only the owning container writes `index`; the tracker just reports it.
pub struct LifecycleTracker {
    index: Cell<usize>,
    manager: RefCell<Weak<dyn PoolObjectManager>>,
    /// Set while the pool itself is re-enabling the instance
    activating: Cell<bool>,
}

impl LifecycleTracker {
    /// Create a tracker that is not managed by any container yet
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            index: Cell::new(0),
            manager: RefCell::new(detached()),
            activating: Cell::new(false),
        })
    }

    /// Current slot of this tracker's pair inside its container
    pub fn index(&self) -> usize {
        self.index.get()
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.index.set(index);
    }

    /// Hand this tracker to a new manager
    ///
    /// The index is left alone; the new manager is expected to have placed
    /// the pair already.
    pub fn set_manager(&self, manager: Weak<dyn PoolObjectManager>) {
        *self.manager.borrow_mut() = manager;
    }

    /// Drop the link to the current manager
    pub fn detach(&self) {
        self.set_manager(detached());
    }

    /// Whether a live manager currently claims this tracker
    pub fn is_managed(&self) -> bool {
        self.manager.borrow().strong_count() > 0
    }

    /// Host hook: the instance went from active to inactive
    pub fn on_disabled(&self) {
        if let Some(manager) = self.current_manager() {
            manager.pool(self);
        }
    }

    /// Host hook: the instance went from inactive to active
    ///
    /// Activations performed by the pool itself are already accounted for
    /// and are not forwarded.
    pub fn on_enabled(&self) {
        if self.activating.get() {
            return;
        }
        if let Some(manager) = self.current_manager() {
            manager.un_pool(self);
        }
    }

    /// Host hook: the instance is being destroyed
    pub fn on_destroyed(&self) {
        if let Some(manager) = self.current_manager() {
            manager.destroy(self);
        }
    }

    /// Run a pool-driven activation of the instance
    ///
    /// Any `on_enabled` the host delivers while `activate` runs is the echo
    /// of this call and is swallowed.
    pub(crate) fn activate_with<R>(&self, activate: impl FnOnce() -> R) -> R {
        let previous = self.activating.replace(true);
        let result = activate();
        self.activating.set(previous);
        result
    }

    fn current_manager(&self) -> Option<Rc<dyn PoolObjectManager>> {
        self.manager.borrow().upgrade()
    }
}

impl fmt::Debug for LifecycleTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleTracker")
            .field("index", &self.index.get())
            .field("managed", &self.is_managed())
            .finish()
    }
}
