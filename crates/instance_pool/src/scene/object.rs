//! Scene objects and their handles

use std::rc::Rc;

use crate::foundation::math::{Placement, Quat, Vec3};
use crate::pool::LifecycleTracker;

slotmap::new_key_type! {
    /// Stable handle to an object living in a [`Scene`](super::Scene)
    ///
    /// Handles are generational: a handle to a destroyed object never
    /// resolves to an object created later in the same slot.
    pub struct ObjectHandle;
}

bitflags::bitflags! {
    /// Per-object state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u8 {
        /// Object takes part in the frame (not retired)
        const ACTIVE = 1 << 0;
        /// Object survives a context reset
        const PERSISTENT = 1 << 1;
    }
}

/// A single object in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Display name, usually the prefab it came from
    pub name: String,

    /// Local position relative to the parent
    pub position: Vec3,

    /// Local rotation relative to the parent
    pub rotation: Quat,

    /// Offset added to every placement, taken from the prefab
    pub pivot: Vec3,

    pub(crate) parent: Option<ObjectHandle>,
    pub(crate) children: Vec<ObjectHandle>,
    pub(crate) flags: ObjectFlags,
    pub(crate) tracker: Option<Rc<LifecycleTracker>>,
}

impl SceneObject {
    pub(crate) fn new(name: impl Into<String>, placement: &Placement) -> Self {
        Self {
            name: name.into(),
            position: placement.position,
            rotation: placement.rotation,
            pivot: Vec3::zeros(),
            parent: None,
            children: Vec::new(),
            flags: ObjectFlags::ACTIVE,
            tracker: None,
        }
    }

    /// Parent in the hierarchy, `None` at the root
    pub const fn parent(&self) -> Option<ObjectHandle> {
        self.parent
    }

    /// Direct children
    pub fn children(&self) -> &[ObjectHandle] {
        &self.children
    }

    /// Current state bits
    pub const fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Whether the object's own active flag is set
    pub const fn is_active(&self) -> bool {
        self.flags.contains(ObjectFlags::ACTIVE)
    }

    /// Lifecycle tracker, present on pooled instances only
    pub fn tracker(&self) -> Option<&Rc<LifecycleTracker>> {
        self.tracker.as_ref()
    }
}
