//! Prefabs: named object templates the scene can instantiate

use std::fmt;

use crate::foundation::math::Vec3;
use crate::pool::Prototype;

/// Template for spawning scene objects
///
/// Two prefabs with the same name are still different prototypes; pools key
/// on the prefab value itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    name: String,
    /// Offset applied on top of the spawn position
    pub pivot: Vec3,
}

impl Prefab {
    /// Create a prefab with no pivot offset
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pivot: Vec3::zeros(),
        }
    }

    /// Set the pivot offset
    #[must_use]
    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    /// Name given to every object spawned from this prefab
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Prototype for Prefab {
    type Instance = super::ObjectHandle;
}

impl fmt::Display for Prefab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefab `{}`", self.name)
    }
}
