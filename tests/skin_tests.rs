//! Integration tests for skin export: bone lists, weights and the skin file.

use kf_export::geom::{weld_mesh, SkinWeightBuilder};
use kf_export::prelude::*;
use kf_export::util::{Affine3A, Vec3};

/// hips -> spine -> (arm, ik_helper -> finger), hips -> leg, plus a skinned quad.
struct Fixture {
    scene: MemoryScene,
    hips: NodeId,
    spine: NodeId,
    arm: NodeId,
    leg: NodeId,
}

fn quad(first: MaterialId, second: MaterialId) -> MemoryMesh {
    MemoryMesh {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        normals: vec![Vec3::Z; 4],
        uvs: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
        faces: vec![MemoryFace::shared([0, 1, 2], first), MemoryFace::shared([0, 2, 3], second)],
    }
}

fn fixture(vertices: Vec<SkinVertex>) -> Fixture {
    let mut scene = MemoryScene::new();
    let red = scene.add_material(Material::new("red"));
    let blue = scene.add_material(Material::new("blue"));

    let hips = scene.add_node(
        MemoryNode::new("hips", ObjectKind::Bone).with_world(Affine3A::from_translation(Vec3::new(0.0, 1.0, 0.0))),
        None,
    );
    let spine = scene.add_node(MemoryNode::new("spine", ObjectKind::Bone), Some(hips));
    let arm = scene.add_node(MemoryNode::new("arm", ObjectKind::Bone), Some(spine));
    let helper = scene.add_node(MemoryNode::new("ik_helper", ObjectKind::Helper), Some(spine));
    let _finger = scene.add_node(MemoryNode::new("finger", ObjectKind::Bone), Some(helper));
    let leg = scene.add_node(MemoryNode::new("leg", ObjectKind::Bone), Some(hips));

    let skin = MemorySkin { bones: vec![hips, spine, arm, leg], vertices };
    scene.add_node(MemoryNode::new("body", ObjectKind::Mesh).with_mesh(quad(red, blue)).with_skin(skin), None);

    Fixture { scene, hips, spine, arm, leg }
}

fn standard() -> Fixture {
    let mut f = fixture(Vec::new());
    let finger = f.scene.find("finger").expect("finger");
    let body = f.scene.find("body").expect("body");
    let vertices = vec![
        SkinVertex::rigid(f.hips),
        SkinVertex::blended(&[(f.spine, 1.0), (f.arm, 3.0)]),
        SkinVertex::blended(&[(finger, 2.0), (f.spine, 2.0)]),
        SkinVertex::rigid(f.leg),
    ];
    f.scene.node_mut(body).skin = Some(MemorySkin { bones: vec![f.hips, f.spine, f.arm, f.leg], vertices });
    f
}

#[test]
fn test_bone_list_is_preorder_without_helpers() -> Result<()> {
    let f = standard();
    let body = f.scene.find("body").expect("body");
    let mesh = weld_mesh("body", f.scene.mesh(body).expect("mesh"))?;
    let skin = SkinWeightBuilder::new(&f.scene, "body").build(f.scene.skin(body).expect("skin"), &mesh)?;

    assert_eq!(skin.bones, vec![f.hips, f.spine, f.arm, f.leg]);
    assert_eq!(skin.parents, vec![None, Some(0), Some(1), Some(0)]);
    assert_eq!(skin.weights.len(), mesh.vertex_count());
    Ok(())
}

#[test]
fn test_weights_follow_welded_layout() -> Result<()> {
    let f = standard();
    let body = f.scene.find("body").expect("body");
    let mesh = weld_mesh("body", f.scene.mesh(body).expect("mesh"))?;
    let skin = SkinWeightBuilder::new(&f.scene, "body").build(f.scene.skin(body).expect("skin"), &mesh)?;

    // submesh "red": source 0, 1, 2; submesh "blue": source 0, 2, 3
    assert_eq!(mesh.original_indices().collect::<Vec<_>>(), vec![0, 1, 2, 0, 2, 3]);

    assert_eq!(skin.weights[0].as_slice(), &[(0, 1.0)]);
    assert_eq!(skin.weights[1].as_slice(), &[(1, 0.25), (2, 0.75)]);
    // finger sits under a helper and folds onto spine
    assert_eq!(skin.weights[2].as_slice(), &[(1, 1.0)]);
    assert_eq!(skin.weights[3], skin.weights[0]);
    assert_eq!(skin.weights[4], skin.weights[2]);
    assert_eq!(skin.weights[5].as_slice(), &[(3, 1.0)]);

    for vector in &skin.weights {
        let sum: f32 = vector.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }
    Ok(())
}

#[test]
fn test_skin_file_contents() -> Result<()> {
    let f = standard();
    let output = Exporter::new(&f.scene, ExportOptions::default().with_skin("_skin")).build()?;
    let skin = output.skin.expect("skin file image");
    assert_eq!(output.stats.skins, 1);

    let chunks = KfReader::new(&skin).read_chunks()?;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].kind(), Some(ChunkId::Skin));

    let mut r = chunks[0].reader();
    assert_eq!(r.read_string()?, "body");

    let bones = r.read_chunk()?;
    let mut b = bones.reader();
    b.read_marker()?;
    assert_eq!(b.read_count()?, 4);
    let mut names = Vec::new();
    for _ in 0..4 {
        names.push(b.read_string()?.to_string());
        b.read_i32()?;
        b.read_mat4x3()?;
    }
    assert_eq!(names, ["hips", "spine", "arm", "leg"]);

    let weights = r.read_chunk()?;
    assert!(r.is_at_end());
    let mut w = weights.reader();
    w.read_marker()?;
    assert_eq!(w.read_count()?, 6);
    w.read_marker()?;
    assert_eq!(w.read_count()?, 1);
    assert_eq!(w.read_u32()?, 0);
    assert_eq!(w.read_f32()?, 1.0);
    w.read_marker()?;
    assert_eq!(w.read_count()?, 2);
    assert_eq!((w.read_u32()?, w.read_f32()?), (1, 0.25));
    assert_eq!((w.read_u32()?, w.read_f32()?), (2, 0.75));
    Ok(())
}

#[test]
fn test_bone_world_transform_is_written() -> Result<()> {
    let f = standard();
    let output = Exporter::new(&f.scene, ExportOptions::default().with_skin("_skin")).build()?;
    let skin = output.skin.expect("skin file image");
    let chunk = KfReader::new(&skin).read_chunk()?;
    let bones = chunk.child(ChunkId::SkinBones)?.expect("bones chunk");

    let mut b = bones.reader();
    b.read_marker()?;
    b.read_count()?;
    assert_eq!(b.read_string()?, "hips");
    assert_eq!(b.read_i32()?, -1);
    assert_eq!(b.read_mat4x3()?.rows[3], Vec3::new(0.0, 1.0, 0.0));
    Ok(())
}

#[test]
fn test_vertex_count_mismatch() {
    let f = fixture(vec![SkinVertex::rigid(NodeId(0))]);
    let err = Exporter::new(&f.scene, ExportOptions::default().with_skin("_skin")).build().unwrap_err();
    assert!(matches!(err, Error::VertexCountMismatch { skin: 1, geometry: 4, .. }), "{err:?}");
}

#[test]
fn test_skin_ignored_unless_requested() -> Result<()> {
    let f = standard();
    let output = Exporter::new(&f.scene, ExportOptions::default()).build()?;
    assert!(output.skin.is_none());
    assert_eq!(output.stats.skins, 0);
    Ok(())
}
