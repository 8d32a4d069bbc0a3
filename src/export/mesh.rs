//! Mesh chunk: node, geometry, polygons, polygon materials, uv mapping.

use crate::geom::WeldedMesh;
use crate::kf::{ChunkId, ChunkWriter, TaggedWrite};
use crate::util::{require_ascii, Affine3A, Mat4x3, Result};

use super::materials::MaterialTable;

/// Everything one mesh chunk needs.
pub struct MeshRecord<'a> {
    pub name: &'a str,
    /// Name of the exported node the transform is relative to.
    pub parent_name: Option<&'a str>,
    pub transform: Affine3A,
    pub mesh: &'a WeldedMesh,
}

pub fn write_mesh(
    record: &MeshRecord<'_>,
    materials: Option<&MaterialTable>,
    uv_mapping: bool,
) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::Mesh);
    chunk.write_chunk(&write_node(record)?)?;
    chunk.write_chunk(&write_geometry(record.mesh)?)?;
    chunk.write_chunk(&write_polygons(record.mesh)?)?;
    chunk.write_chunk(&write_polygon_materials(record.mesh, materials)?)?;
    if uv_mapping {
        chunk.write_chunk(&write_uv_mapping(record.mesh)?)?;
    }
    Ok(chunk)
}

fn write_node(record: &MeshRecord<'_>) -> Result<ChunkWriter> {
    require_ascii(record.name)?;
    let mut chunk = ChunkWriter::for_id(ChunkId::Node);
    chunk.write_string(record.name)?;
    chunk.write_string(record.parent_name.unwrap_or(""))?;
    chunk.write_mat4x3(&Mat4x3::from_affine(&record.transform));
    Ok(chunk)
}

fn write_geometry(mesh: &WeldedMesh) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::Geometry);
    chunk.write_count(mesh.original_vertex_count)?;
    chunk.write_count(mesh.submeshes.len())?;
    for sub in &mesh.submeshes {
        chunk.write_count(sub.vertex_count())?;
        for v in &sub.vertices {
            chunk.write_vec3(*v);
        }
        for n in &sub.normals {
            chunk.write_vec3(*n);
        }
    }
    Ok(chunk)
}

fn write_polygons(mesh: &WeldedMesh) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::Polygons);
    chunk.write_count(mesh.submeshes.len())?;
    for sub in &mesh.submeshes {
        chunk.write_u32_array(&sub.indices)?;
    }
    Ok(chunk)
}

/// Material list index per submesh, -1 when no list is written.
fn write_polygon_materials(mesh: &WeldedMesh, materials: Option<&MaterialTable>) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::PolygonMaterials);
    chunk.write_count(mesh.submeshes.len())?;
    for sub in &mesh.submeshes {
        let index = materials
            .and_then(|table| table.index_of(sub.material))
            .map_or(-1, |i| i as i32);
        chunk.write_i32(index);
    }
    Ok(chunk)
}

fn write_uv_mapping(mesh: &WeldedMesh) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::UvMapping);
    chunk.write_count(mesh.submeshes.len())?;
    for sub in &mesh.submeshes {
        chunk.write_vec3_array(&sub.uvs)?;
    }
    Ok(chunk)
}
