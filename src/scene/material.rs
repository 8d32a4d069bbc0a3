//! Material description consumed by the material-list chunk.

use serde::{Deserialize, Serialize};

use crate::util::Vec3;

/// Texture map reference. Only the names travel into the file; the bitmap
/// itself is never copied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    /// Path of the bitmap the map samples. Procedural maps have none.
    #[serde(default)]
    pub bitmap: Option<String>,
}

impl Texture {
    pub fn bitmap(name: &str, path: &str) -> Self {
        Self { name: name.to_string(), bitmap: Some(path.to_string()) }
    }
}

/// Standard surface parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub opacity: f32,
    pub glossiness: f32,
    pub diffuse_map: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::splat(0.588),
            diffuse: Vec3::splat(0.588),
            specular: Vec3::splat(0.9),
            opacity: 1.0,
            glossiness: 0.1,
            diffuse_map: None,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    pub fn with_diffuse(mut self, diffuse: Vec3) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_diffuse_map(mut self, map: Texture) -> Self {
        self.diffuse_map = Some(map);
        self
    }
}
