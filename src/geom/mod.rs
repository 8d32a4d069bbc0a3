//! Geometry processing between the scene and the writer.
//!
//! - [`weld`] - per-material vertex welding
//! - [`skin`] - canonical bone lists and normalized weights
//! - [`xform`] - node transforms relative to exported ancestors

pub mod skin;
pub mod weld;
pub mod xform;

pub use skin::{Skin, SkinWeightBuilder, WeightVector};
pub use weld::{weld_mesh, CornerAttributes, CornerKey, SubMesh, VertexWelder, WeldedMesh};
pub use xform::{flatten_transforms, nearest_exported_ancestor, ExportNode};
