//! Material table consulted by the model loader
//!
//! Material libraries are merged into a [`MaterialTable`] and `usemtl` records
//! resolve names through it. [`MaterialRegistry`] is the in-memory table and
//! [`SharedMaterialRegistry`] wraps it for loads running on several threads.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::foundation::math::Color;

/// Identifier of a registered material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// The material bound before any `usemtl`
    pub const DEFAULT: Self = Self(0);
}

/// Name of the material registered under [`MaterialId::DEFAULT`]
pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Name to material lookup used while assembling a model
pub trait MaterialTable {
    /// Find a material by name
    fn resolve(&self, name: &str) -> Option<MaterialId>;

    /// Add or update a material, returning its id
    fn register(&mut self, name: &str, color: Color) -> MaterialId;
}

/// In-memory material table
///
/// Id 0 is reserved for the default material. Registering an existing name keeps
/// its id and updates the color.
#[derive(Debug, Clone)]
pub struct MaterialRegistry {
    ids: HashMap<String, MaterialId>,
    entries: Vec<(String, Color)>,
}

impl MaterialRegistry {
    /// Create a registry holding only the default material
    pub fn new() -> Self {
        Self {
            ids: HashMap::from([(DEFAULT_MATERIAL_NAME.to_string(), MaterialId::DEFAULT)]),
            entries: vec![(DEFAULT_MATERIAL_NAME.to_string(), Color::DEFAULT_DIFFUSE)],
        }
    }

    /// Color of a registered material
    pub fn color(&self, id: MaterialId) -> Option<Color> {
        self.entries.get(id.0 as usize).map(|(_, color)| *color)
    }

    /// Name of a registered material
    pub fn name(&self, id: MaterialId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|(name, _)| name.as_str())
    }

    /// Number of registered materials, the default included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, the default material is always present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(id, name, color)` in registration order
    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &str, Color)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, (name, color))| (MaterialId(index as u32), name.as_str(), *color))
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialTable for MaterialRegistry {
    fn resolve(&self, name: &str) -> Option<MaterialId> {
        self.ids.get(name).copied()
    }

    fn register(&mut self, name: &str, color: Color) -> MaterialId {
        if let Some(&id) = self.ids.get(name) {
            self.entries[id.0 as usize].1 = color;
            log::debug!("Updated material '{}' ({:?})", name, id);
            return id;
        }

        let id = MaterialId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        self.ids.insert(name.to_string(), id);
        self.entries.push((name.to_string(), color));
        log::debug!("Registered material '{}' as {:?}", name, id);
        id
    }
}

/// Thread-safe handle to a [`MaterialRegistry`]
///
/// Each load still owns its own parse state; only the merge into the shared
/// table takes the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedMaterialRegistry {
    inner: Arc<RwLock<MaterialRegistry>>,
}

impl SharedMaterialRegistry {
    /// Create a shared registry holding only the default material
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a closure with read access to the registry
    pub fn with<T>(&self, f: impl FnOnce(&MaterialRegistry) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl MaterialTable for SharedMaterialRegistry {
    fn resolve(&self, name: &str) -> Option<MaterialId> {
        self.with(|registry| registry.resolve(name))
    }

    fn register(&mut self, name: &str, color: Color) -> MaterialId {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.register(name, color)
    }
}
