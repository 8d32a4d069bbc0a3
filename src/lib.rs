//! # KF Export
//!
//! Writes 3D scenes to the KF chunked binary asset format: a stream of
//! tagged little-endian primitives grouped into size-prefixed chunks.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math types
//! - [`kf`] - Low-level format: tags, chunk writer, reader
//! - [`scene`] - Scene access traits and an in-memory scene
//! - [`geom`] - Vertex welding, skin weights, transform flattening
//! - [`export`] - Scene to file pipeline
//!
//! ## Example
//!
//! ```ignore
//! use kf_export::prelude::*;
//!
//! let scene = MemoryScene::from_json_file("scene.json")?;
//! let summary = Exporter::new(&scene, ExportOptions::default().with_skin("_skin"))
//!     .export("scene.kf")?;
//! println!("{} meshes", summary.stats.meshes);
//! ```

pub mod util;
pub mod kf;
pub mod scene;
pub mod geom;
pub mod export;

pub use export::{ExportOptions, ExportOutput, ExportStats, ExportSummary, Exporter};
pub use util::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::export::{ExportOptions, ExportOutput, ExportSummary, Exporter};
    pub use crate::kf::{ChunkId, ChunkView, ChunkWriter, KfReader, KfWriter, TaggedWrite, Value};
    pub use crate::scene::{
        Material, MaterialId, MemoryFace, MemoryMesh, MemoryNode, MemoryScene, MemorySkin, NodeId,
        ObjectKind, SceneProvider, SkinVertex, Texture,
    };
    pub use crate::util::{Error, Result};
}
