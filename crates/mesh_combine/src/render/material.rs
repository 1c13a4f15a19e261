//! Material system
//!
//! Materials are only ever compared by identity while combining: two materials
//! with identical parameters but different [`MaterialId`]s form two groups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable handle to a registered material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// Material properties for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name
    pub name: String,

    /// Base color (RGB)
    pub base_color: [f32; 3],

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Alpha/transparency (0.0 = transparent, 1.0 = opaque)
    pub alpha: f32,
}

impl Material {
    /// Create a new material with default properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color: [1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            alpha: 1.0,
        }
    }

    /// Set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b];
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the alpha/transparency
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default")
    }
}

/// Owner of all materials referenced by a scene
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    materials: HashMap<MaterialId, Material>,
    by_name: HashMap<String, MaterialId>,
    next_id: u32,
}

impl MaterialRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material and return its new identity
    ///
    /// Registering two materials with the same name yields two distinct ids;
    /// name lookups resolve to the first one.
    pub fn register(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next_id);
        self.next_id += 1;
        self.by_name.entry(material.name.clone()).or_insert(id);
        log::debug!("Registered material {:?} as {:?}", material.name, id);
        self.materials.insert(id, material);
        id
    }

    /// Resolve a material by name, registering a default one if unknown
    pub fn get_or_register(&mut self, name: &str) -> MaterialId {
        match self.by_name.get(name) {
            Some(&id) => id,
            None => self.register(Material::new(name)),
        }
    }

    /// Get a material by ID
    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// First material registered under `name`
    pub fn find_by_name(&self, name: &str) -> Option<MaterialId> {
        self.by_name.get(name).copied()
    }

    /// Name of a material, if registered
    pub fn name_of(&self, id: MaterialId) -> Option<&str> {
        self.get(id).map(|material| material.name.as_str())
    }

    /// All registered ids in registration order
    pub fn ids(&self) -> Vec<MaterialId> {
        let mut ids: Vec<MaterialId> = self.materials.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
