//! Vertex welding: face corners to per-material indexed vertex buffers.
//!
//! A corner is identified by its material and its position, normal and uv
//! indices. Corners with identical keys share one output vertex; corners
//! that differ in any index (hard edges, uv seams) never merge.

use std::collections::HashMap;

use crate::scene::{MaterialId, MeshProvider};
use crate::util::{Error, Result, Vec3};

/// Dedup key of one face corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CornerKey {
    pub material: MaterialId,
    pub position: u32,
    pub normal: u32,
    pub uv: u32,
}

/// Attribute values of one face corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec3,
}

/// Triangles of one material with their own compact vertex arrays.
///
/// `vertices`, `normals` and `uvs` are parallel; `indices` holds whole
/// triangles.
#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub material: MaterialId,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec3>,
    pub indices: Vec<u32>,
    /// Source position index of each local vertex, indexed by local index.
    pub local_to_original: Vec<u32>,
}

impl SubMesh {
    fn new(material: MaterialId) -> Self {
        Self {
            material,
            vertices: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            local_to_original: Vec::new(),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Source position index of a local vertex.
    pub fn original_index(&self, local: u32) -> Option<u32> {
        self.local_to_original.get(local as usize).copied()
    }
}

/// Welded mesh: submeshes in first-use order of their material.
#[derive(Clone, Debug, PartialEq)]
pub struct WeldedMesh {
    /// Position count of the source geometry, before welding.
    pub original_vertex_count: usize,
    pub submeshes: Vec<SubMesh>,
}

impl WeldedMesh {
    /// Output vertices across all submeshes.
    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(SubMesh::triangle_count).sum()
    }

    /// Source position index of every output vertex, in submesh order.
    pub fn original_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.submeshes.iter().flat_map(|s| s.local_to_original.iter().copied())
    }
}

/// Incremental welder.
#[derive(Debug, Default)]
pub struct VertexWelder {
    lookup: HashMap<CornerKey, u32>,
    by_material: HashMap<MaterialId, usize>,
    submeshes: Vec<SubMesh>,
}

impl VertexWelder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weld one corner and append its local index to the material's
    /// triangle list. Returns the local index.
    pub fn weld(&mut self, key: CornerKey, attrs: &CornerAttributes) -> Result<u32> {
        let slot = match self.by_material.get(&key.material) {
            Some(&slot) => slot,
            None => {
                self.submeshes.push(SubMesh::new(key.material));
                let slot = self.submeshes.len() - 1;
                self.by_material.insert(key.material, slot);
                slot
            }
        };
        let submesh = &mut self.submeshes[slot];

        let local = match self.lookup.get(&key) {
            Some(&local) => local,
            None => {
                let local = local_index(submesh.vertices.len())?;
                submesh.vertices.push(attrs.position);
                submesh.normals.push(attrs.normal);
                submesh.uvs.push(attrs.uv);
                submesh.local_to_original.push(key.position);
                self.lookup.insert(key, local);
                local
            }
        };
        submesh.indices.push(local);
        Ok(local)
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    pub fn finish(self, original_vertex_count: usize) -> WeldedMesh {
        WeldedMesh { original_vertex_count, submeshes: self.submeshes }
    }
}

/// Next local index of a submesh holding `count` vertices.
fn local_index(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| Error::CountOverflow(count))
}

/// Weld every face of `mesh`.
///
/// Fails on the first face without a material or with a corner index past
/// the end of its attribute array. A mesh with no uv channel welds with zero
/// uvs.
pub fn weld_mesh(name: &str, mesh: &dyn MeshProvider) -> Result<WeldedMesh> {
    let mut welder = VertexWelder::new();
    let has_uvs = mesh.uv_count() > 0;

    for face_index in 0..mesh.face_count() {
        let material = mesh
            .face_material(face_index)
            .ok_or_else(|| Error::MissingMaterial { mesh: name.to_string(), face: face_index })?;
        let face = mesh.face(face_index);

        for corner in 0..3 {
            let key = CornerKey {
                material,
                position: face.vertices[corner],
                normal: face.normals[corner],
                uv: face.uvs[corner],
            };
            let out_of_range = |what: &'static str, index: u32, count: usize| Error::IndexOutOfRange {
                mesh: name.to_string(),
                what,
                index,
                count,
            };

            let position = mesh
                .position(key.position)
                .ok_or_else(|| out_of_range("position", key.position, mesh.vertex_count()))?;
            let normal = mesh
                .normal(key.normal)
                .ok_or_else(|| out_of_range("normal", key.normal, mesh.normal_count()))?;
            let uv = if has_uvs {
                mesh.uv(key.uv).ok_or_else(|| out_of_range("uv", key.uv, mesh.uv_count()))?
            } else {
                Vec3::ZERO
            };

            welder.weld(key, &CornerAttributes { position, normal, uv })?;
        }
    }

    let welded = welder.finish(mesh.vertex_count());
    tracing::debug!(
        mesh = name,
        submeshes = welded.submeshes.len(),
        vertices = welded.vertex_count(),
        triangles = welded.triangle_count(),
        "welded mesh"
    );
    Ok(welded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryFace, MemoryMesh};

    fn attrs(i: u32) -> CornerAttributes {
        CornerAttributes { position: Vec3::splat(i as f32), normal: Vec3::Z, uv: Vec3::ZERO }
    }

    fn grid_mesh() -> MemoryMesh {
        MemoryMesh {
            positions: (0..6).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
            normals: vec![Vec3::Z, Vec3::Y],
            uvs: (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
            faces: Vec::new(),
        }
    }

    #[test]
    fn test_weld_same_key_twice() -> Result<()> {
        let mut welder = VertexWelder::new();
        let key = CornerKey { material: MaterialId(0), position: 3, normal: 1, uv: 2 };
        let first = welder.weld(key, &attrs(3))?;
        let count = welder.submeshes()[0].vertex_count();
        let second = welder.weld(key, &attrs(3))?;

        assert_eq!(first, second);
        assert_eq!(welder.submeshes()[0].vertex_count(), count);
        assert_eq!(welder.submeshes()[0].indices, vec![first, first]);
        Ok(())
    }

    #[test]
    fn test_differing_normal_or_uv_splits() -> Result<()> {
        let mut welder = VertexWelder::new();
        let m = MaterialId(0);
        let a = welder.weld(CornerKey { material: m, position: 0, normal: 0, uv: 0 }, &attrs(0))?;
        let b = welder.weld(CornerKey { material: m, position: 0, normal: 1, uv: 0 }, &attrs(0))?;
        let c = welder.weld(CornerKey { material: m, position: 0, normal: 0, uv: 1 }, &attrs(0))?;
        assert_eq!((a, b, c), (0, 1, 2));
        let welded = welder.finish(1);
        assert_eq!(welded.submeshes[0].local_to_original, vec![0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_local_index_limit() {
        assert_eq!(local_index(0).ok(), Some(0));
        assert_eq!(local_index(u32::MAX as usize).ok(), Some(u32::MAX));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_local_index_overflow() {
        let count = u32::MAX as usize + 1;
        assert!(matches!(local_index(count), Err(Error::CountOverflow(c)) if c == count));
    }

    #[test]
    fn test_shared_corner_between_faces() -> Result<()> {
        let mut mesh = grid_mesh();
        let m = MaterialId(4);
        mesh.faces.push(MemoryFace { vertices: [0, 3, 1], normals: [0, 1, 0], uvs: [0, 2, 1], material: Some(m) });
        mesh.faces.push(MemoryFace { vertices: [3, 4, 5], normals: [1, 0, 0], uvs: [2, 3, 3], material: Some(m) });

        let welded = weld_mesh("quad", &mesh)?;
        let sub = &welded.submeshes[0];
        assert_eq!(welded.submeshes.len(), 1);
        assert_eq!(sub.indices.len(), 6);
        // (v=3, n=1, u=2) appears in both faces and is stored once.
        assert_eq!(sub.vertex_count(), 5);
        assert_eq!(sub.indices[1], sub.indices[3]);
        assert_eq!(sub.original_index(sub.indices[3]), Some(3));
        assert_eq!(sub.normals[sub.indices[3] as usize], Vec3::Y);
        assert_eq!(sub.vertices.len(), sub.uvs.len());
        assert_eq!(welded.original_vertex_count, 6);
        Ok(())
    }

    #[test]
    fn test_partition_by_material() -> Result<()> {
        let mut mesh = grid_mesh();
        mesh.faces.push(MemoryFace::shared([0, 1, 2], MaterialId(7)));
        mesh.faces.push(MemoryFace::shared([1, 2, 3], MaterialId(2)));
        mesh.normals = vec![Vec3::Z; 6];
        mesh.uvs = vec![Vec3::ZERO; 6];
        mesh.faces.push(MemoryFace::shared([0, 1, 2], MaterialId(7)));

        let welded = weld_mesh("split", &mesh)?;
        assert_eq!(welded.submeshes.len(), 2);
        assert_eq!(welded.submeshes[0].material, MaterialId(7));
        assert_eq!(welded.submeshes[0].vertex_count(), 3);
        assert_eq!(welded.submeshes[0].triangle_count(), 2);
        // Same positions under another material are not shared.
        assert_eq!(welded.submeshes[1].material, MaterialId(2));
        assert_eq!(welded.submeshes[1].indices, vec![0, 1, 2]);
        assert_eq!(welded.vertex_count(), 6);
        assert_eq!(welded.original_indices().collect::<Vec<_>>(), vec![0, 1, 2, 1, 2, 3]);
        for sub in &welded.submeshes {
            assert_eq!(sub.indices.len() % 3, 0);
        }
        Ok(())
    }

    #[test]
    fn test_missing_material_aborts() {
        let mut mesh = grid_mesh();
        mesh.faces.push(MemoryFace::shared([0, 1, 0], MaterialId(0)));
        mesh.faces.push(MemoryFace { material: None, ..MemoryFace::shared([0, 1, 0], MaterialId(0)) });
        let err = weld_mesh("holey", &mesh).unwrap_err();
        assert!(matches!(err, Error::MissingMaterial { face: 1, .. }));
    }

    #[test]
    fn test_out_of_range_normal() {
        let mut mesh = grid_mesh();
        mesh.faces.push(MemoryFace { vertices: [0, 1, 2], normals: [0, 0, 9], uvs: [0, 0, 0], material: Some(MaterialId(0)) });
        let err = weld_mesh("bad", &mesh).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { what: "normal", index: 9, count: 2, .. }));
    }

    #[test]
    fn test_missing_uv_channel_welds_zero() -> Result<()> {
        let mut mesh = grid_mesh();
        mesh.uvs.clear();
        mesh.faces.push(MemoryFace { vertices: [0, 1, 2], normals: [0, 0, 0], uvs: [5, 6, 7], material: Some(MaterialId(0)) });
        let welded = weld_mesh("plain", &mesh)?;
        assert!(welded.submeshes[0].uvs.iter().all(|uv| *uv == Vec3::ZERO));
        Ok(())
    }
}
