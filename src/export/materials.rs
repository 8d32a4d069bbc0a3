//! Material list chunk.

use std::collections::HashMap;

use crate::kf::{ChunkId, ChunkWriter, TaggedWrite};
use crate::scene::{Material, MaterialId, SceneProvider};
use crate::util::{require_ascii, Error, Result};

/// Export-order index of every material used by the exported meshes.
#[derive(Debug, Default)]
pub struct MaterialTable {
    order: Vec<MaterialId>,
    index: HashMap<MaterialId, u32>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `id`, assigned on first sight.
    pub fn intern(&mut self, id: MaterialId) -> u32 {
        *self.index.entry(id).or_insert_with(|| {
            self.order.push(id);
            (self.order.len() - 1) as u32
        })
    }

    pub fn index_of(&self, id: MaterialId) -> Option<u32> {
        self.index.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[MaterialId] {
        &self.order
    }
}

/// MaterialList chunk holding one Material chunk per table entry.
pub fn write_material_list<S: SceneProvider + ?Sized>(
    scene: &S,
    table: &MaterialTable,
) -> Result<ChunkWriter> {
    let mut list = ChunkWriter::for_id(ChunkId::MaterialList);
    list.write_count(table.len())?;
    for &id in table.ids() {
        let material = scene.material(id).ok_or(Error::UnknownMaterial(id.0))?;
        list.write_chunk(&write_material(material)?)?;
    }
    Ok(list)
}

fn write_material(material: &Material) -> Result<ChunkWriter> {
    require_ascii(&material.name)?;

    let mut chunk = ChunkWriter::for_id(ChunkId::Material);
    chunk.write_string(&material.name)?;
    chunk.write_vec3(material.ambient);
    chunk.write_vec3(material.diffuse);
    chunk.write_vec3(material.specular);
    chunk.write_f32(material.opacity);
    chunk.write_f32(material.glossiness);

    match &material.diffuse_map {
        Some(map) => {
            let bitmap = map.bitmap.as_deref().ok_or_else(|| Error::TextureWithoutBitmap {
                material: material.name.clone(),
                texture: map.name.clone(),
            })?;
            chunk.write_bool(true);
            chunk.write_string(&map.name)?;
            chunk.write_string(bitmap)?;
        }
        None => chunk.write_bool(false),
    }
    Ok(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kf::KfReader;
    use crate::scene::{MemoryScene, Texture};
    use crate::util::Vec3;

    #[test]
    fn test_intern_first_encounter_order() {
        let mut table = MaterialTable::new();
        assert_eq!(table.intern(MaterialId(5)), 0);
        assert_eq!(table.intern(MaterialId(2)), 1);
        assert_eq!(table.intern(MaterialId(5)), 0);
        assert_eq!(table.ids(), &[MaterialId(5), MaterialId(2)]);
        assert_eq!(table.index_of(MaterialId(9)), None);
    }

    #[test]
    fn test_material_chunk_fields() -> Result<()> {
        let mut scene = MemoryScene::new();
        let id = scene.add_material(
            Material::new("brick")
                .with_diffuse(Vec3::new(0.5, 0.2, 0.1))
                .with_diffuse_map(Texture::bitmap("Bricks", "maps/brick.png")),
        );
        let mut table = MaterialTable::new();
        table.intern(id);

        let list = write_material_list(&scene, &table)?;
        let mut r = KfReader::new(list.payload());
        assert_eq!(r.read_u32()?, 1);
        let chunk = r.read_chunk()?;
        assert_eq!(chunk.kind(), Some(ChunkId::Material));

        let mut m = chunk.reader();
        assert_eq!(m.read_string()?, "brick");
        m.read_vec3()?;
        assert_eq!(m.read_vec3()?, Vec3::new(0.5, 0.2, 0.1));
        m.read_vec3()?;
        assert_eq!(m.read_f32()?, 1.0);
        m.read_f32()?;
        assert!(m.read_bool()?);
        assert_eq!(m.read_string()?, "Bricks");
        assert_eq!(m.read_string()?, "maps/brick.png");
        assert!(m.is_at_end());
        Ok(())
    }

    #[test]
    fn test_texture_without_bitmap() {
        let mut scene = MemoryScene::new();
        let id = scene.add_material(Material::new("noise").with_diffuse_map(Texture { name: "Noise".into(), bitmap: None }));
        let mut table = MaterialTable::new();
        table.intern(id);
        let err = write_material_list(&scene, &table).unwrap_err();
        assert!(matches!(err, Error::TextureWithoutBitmap { ref texture, .. } if texture == "Noise"));
    }

    #[test]
    fn test_unknown_material_handle() {
        let scene = MemoryScene::new();
        let mut table = MaterialTable::new();
        table.intern(MaterialId(3));
        assert!(matches!(write_material_list(&scene, &table), Err(Error::UnknownMaterial(3))));
    }
}
