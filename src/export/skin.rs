//! Skin chunk for the companion skin file.

use crate::geom::Skin;
use crate::kf::{ChunkId, ChunkWriter, TaggedWrite};
use crate::scene::SceneProvider;
use crate::util::{require_ascii, Mat4x3, Result};

pub fn write_skin<S: SceneProvider + ?Sized>(scene: &S, mesh_name: &str, skin: &Skin) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::Skin);
    chunk.write_string(mesh_name)?;
    chunk.write_chunk(&write_bones(scene, skin)?)?;
    chunk.write_chunk(&write_weights(skin)?)?;
    Ok(chunk)
}

fn write_bones<S: SceneProvider + ?Sized>(scene: &S, skin: &Skin) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::SkinBones);
    chunk.write_marker();
    chunk.write_count(skin.bones.len())?;
    for (&bone, parent) in skin.bones.iter().zip(&skin.parents) {
        let name = scene.name(bone);
        require_ascii(name)?;
        chunk.write_string(name)?;
        chunk.write_i32(parent.map_or(-1, |p| p as i32));
        chunk.write_mat4x3(&Mat4x3::from_affine(&scene.world_transform(bone)));
    }
    Ok(chunk)
}

fn write_weights(skin: &Skin) -> Result<ChunkWriter> {
    let mut chunk = ChunkWriter::for_id(ChunkId::SkinWeights);
    chunk.write_marker();
    chunk.write_count(skin.weights.len())?;
    for vector in &skin.weights {
        chunk.write_marker();
        chunk.write_count(vector.len())?;
        for &(bone, weight) in vector {
            chunk.write_u32(bone);
            chunk.write_f32(weight);
        }
    }
    Ok(chunk)
}
