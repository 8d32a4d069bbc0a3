//! Export configuration.

use serde::{Deserialize, Serialize};

/// Immutable settings for one export call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Write the material-list chunk.
    pub materials: bool,
    /// Express transforms relative to the nearest exported ancestor.
    pub keep_hierarchy: bool,
    /// Write a uv-mapping chunk per mesh.
    pub uv_mapping: bool,
    /// Write skin data to a companion file.
    pub skin: bool,
    /// Appended to the primary file stem to name the skin file.
    pub skin_suffix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            materials: true,
            keep_hierarchy: true,
            uv_mapping: true,
            skin: false,
            skin_suffix: "_skin".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materials(mut self, enabled: bool) -> Self {
        self.materials = enabled;
        self
    }

    pub fn with_hierarchy(mut self, keep: bool) -> Self {
        self.keep_hierarchy = keep;
        self
    }

    pub fn with_uv_mapping(mut self, enabled: bool) -> Self {
        self.uv_mapping = enabled;
        self
    }

    /// Enable skin export with the given file suffix.
    pub fn with_skin(mut self, suffix: &str) -> Self {
        self.skin = true;
        self.skin_suffix = suffix.to_string();
        self
    }
}
