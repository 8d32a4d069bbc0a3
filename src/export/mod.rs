//! Scene to KF export pipeline.
//!
//! One export is a single blocking pass:
//! 1. collect mesh nodes in preorder
//! 2. flatten their transforms
//! 3. weld each mesh and resolve its skin
//! 4. write the material list, mesh chunks and skin chunks in memory
//! 5. write the files
//!
//! Any error aborts before step 5. Both files are staged as temporaries and
//! only moved into place once both are written, so a failed export never
//! leaves a file behind.

mod materials;
mod mesh;
mod options;
mod skin;

pub use materials::{write_material_list, MaterialTable};
pub use mesh::{write_mesh, MeshRecord};
pub use options::ExportOptions;
pub use skin::write_skin;

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::geom::{flatten_transforms, weld_mesh, ExportNode, Skin, SkinWeightBuilder, WeldedMesh};
use crate::kf::{KfWriter, TaggedWrite};
use crate::scene::{NodeId, ObjectKind, SceneProvider};
use crate::util::{Error, Result};

/// Counts gathered while building an export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub meshes: usize,
    pub materials: usize,
    pub submeshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub skins: usize,
}

/// File images of a finished export.
#[derive(Clone, Debug)]
pub struct ExportOutput {
    pub primary: Vec<u8>,
    /// Present when skin export was requested and at least one mesh is skinned.
    pub skin: Option<Vec<u8>>,
    pub stats: ExportStats,
}

/// What [`Exporter::export`] wrote.
#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub stats: ExportStats,
    pub primary_path: PathBuf,
    pub skin_path: Option<PathBuf>,
}

/// Mesh node ready to be written.
struct PreparedMesh {
    node: ExportNode,
    mesh: WeldedMesh,
    skin: Option<Skin>,
}

/// Exports one scene with fixed options.
pub struct Exporter<'a, S: SceneProvider + ?Sized> {
    scene: &'a S,
    options: ExportOptions,
}

impl<'a, S: SceneProvider + ?Sized> Exporter<'a, S> {
    pub fn new(scene: &'a S, options: ExportOptions) -> Self {
        Self { scene, options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Mesh nodes in preorder. Cameras, lights, helpers, bones and groups
    /// are skipped; unsupported kinds abort.
    pub fn collect_nodes(&self) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.scene.top_level_nodes().into_iter().rev().collect();

        while let Some(node) = stack.pop() {
            match self.scene.kind(node) {
                ObjectKind::Mesh => {
                    if self.scene.mesh(node).is_none() {
                        return Err(Error::invalid_scene(format!(
                            "mesh node '{}' has no geometry",
                            self.scene.name(node)
                        )));
                    }
                    out.push(node);
                }
                ObjectKind::Unsupported(kind) => {
                    return Err(Error::UnsupportedObject { node: self.scene.name(node).to_string(), kind });
                }
                kind => {
                    tracing::debug!(node = self.scene.name(node), kind = kind.name(), "skipping node");
                }
            }
            stack.extend(self.scene.children(node).into_iter().rev());
        }
        Ok(out)
    }

    /// Build both file images in memory.
    pub fn build(&self) -> Result<ExportOutput> {
        let nodes = self.collect_nodes()?;
        let flattened = flatten_transforms(self.scene, &nodes, self.options.keep_hierarchy);

        let mut prepared = Vec::with_capacity(flattened.len());
        for node in flattened {
            prepared.push(self.prepare(node)?);
        }

        let mut table = MaterialTable::new();
        for p in &prepared {
            for sub in &p.mesh.submeshes {
                table.intern(sub.material);
            }
        }

        let mut stats = ExportStats { meshes: prepared.len(), ..Default::default() };
        let mut primary = KfWriter::new();
        if self.options.materials {
            primary.write_chunk(&write_material_list(self.scene, &table)?)?;
            stats.materials = table.len();
        }

        let mut skin_writer = KfWriter::new();
        for p in &prepared {
            let name = self.scene.name(p.node.node);
            let record = MeshRecord {
                name,
                parent_name: p.node.parent.map(|parent| self.scene.name(parent)),
                transform: p.node.transform,
                mesh: &p.mesh,
            };
            let materials = self.options.materials.then_some(&table);
            primary.write_chunk(&write_mesh(&record, materials, self.options.uv_mapping)?)?;

            if let Some(skin) = &p.skin {
                skin_writer.write_chunk(&write_skin(self.scene, name, skin)?)?;
                stats.skins += 1;
            }

            stats.submeshes += p.mesh.submeshes.len();
            stats.vertices += p.mesh.vertex_count();
            stats.triangles += p.mesh.triangle_count();
        }

        let skin = if stats.skins > 0 {
            Some(skin_writer.into_bytes())
        } else {
            if self.options.skin {
                tracing::warn!("skin export requested but no exported mesh is skinned");
            }
            None
        };

        Ok(ExportOutput { primary: primary.into_bytes(), skin, stats })
    }

    fn prepare(&self, node: ExportNode) -> Result<PreparedMesh> {
        let name = self.scene.name(node.node);
        let _span = tracing::info_span!("mesh", name).entered();

        let provider = self
            .scene
            .mesh(node.node)
            .ok_or_else(|| Error::invalid_scene(format!("mesh node '{name}' has no geometry")))?;
        let mesh = weld_mesh(name, provider)?;

        let skin = match self.scene.skin(node.node) {
            Some(source) if self.options.skin => {
                Some(SkinWeightBuilder::new(self.scene, name).build(source, &mesh)?)
            }
            _ => None,
        };
        Ok(PreparedMesh { node, mesh, skin })
    }

    /// Build everything, then write the primary file and the skin file.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<ExportSummary> {
        let path = path.as_ref();
        let _span = tracing::info_span!("export", path = %path.display()).entered();
        let output = self.build()?;

        let skin_target = output.skin.as_ref().map(|_| skin_path(path, &self.options.skin_suffix));
        let staged_skin = match (&output.skin, &skin_target) {
            (Some(bytes), Some(target)) => Some(stage(target, bytes)?),
            _ => None,
        };
        let staged_primary = stage(path, &output.primary)?;

        staged_primary.persist(path).map_err(|e| Error::Io(e.error))?;
        if let (Some(staged), Some(target)) = (staged_skin, &skin_target) {
            if let Err(e) = staged.persist(target) {
                if let Err(cleanup) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %cleanup, "failed to remove primary file");
                }
                return Err(Error::Io(e.error));
            }
        }

        tracing::info!(
            path = %path.display(),
            meshes = output.stats.meshes,
            materials = output.stats.materials,
            vertices = output.stats.vertices,
            triangles = output.stats.triangles,
            skins = output.stats.skins,
            "export complete"
        );

        Ok(ExportSummary { stats: output.stats, primary_path: path.to_path_buf(), skin_path: skin_target })
    }
}

/// Write `bytes` to a temporary file beside `target`. Dropping the result
/// without persisting it removes the file.
fn stage(target: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    Ok(file)
}

/// Companion skin file path: `<stem><suffix>.<ext>` beside `primary`.
pub fn skin_path(primary: &Path, suffix: &str) -> PathBuf {
    let stem = primary.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let mut name = format!("{stem}{suffix}");
    if let Some(ext) = primary.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    primary.with_file_name(name)
}
