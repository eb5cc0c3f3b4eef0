//! Math utilities and types
//!
//! Provides the math types needed to place pooled instances in the world.

pub use nalgebra::{Quaternion, Unit, Vector3};

use crate::scene::ObjectHandle;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Where an instance should appear when it is handed out
///
/// Mirrors the position/rotation/parent triple every spawn call takes. The
/// parent is a handle into the host's hierarchy; `None` places the instance
/// at the root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Parent in the host hierarchy
    pub parent: Option<ObjectHandle>,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            parent: None,
        }
    }
}

impl Placement {
    /// Placement at the origin with identity rotation and no parent
    pub fn origin() -> Self {
        Self::default()
    }

    /// Create a placement with only position
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a placement with position and rotation
    pub fn at_rotated(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Return this placement parented under `parent`
    #[must_use]
    pub fn with_parent(mut self, parent: ObjectHandle) -> Self {
        self.parent = Some(parent);
        self
    }
}
