//! Plain-data scene implementing every provider trait.
//!
//! Nodes live in an arena and refer to their parent by [`NodeId`]; child
//! lists are derived when the scene is built or loaded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Face, Material, MaterialId, MeshProvider, NodeId, ObjectKind, SceneProvider, SkinProvider,
    VertexKind,
};
use crate::util::{Affine3A, Error, Result, Vec3};

/// One face plus its material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFace {
    pub vertices: [u32; 3],
    pub normals: [u32; 3],
    pub uvs: [u32; 3],
    #[serde(default)]
    pub material: Option<MaterialId>,
}

impl MemoryFace {
    /// Face whose normal and uv indices equal its position indices.
    pub fn shared(vertices: [u32; 3], material: MaterialId) -> Self {
        Self { vertices, normals: vertices, uvs: vertices, material: Some(material) }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryMesh {
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub normals: Vec<Vec3>,
    #[serde(default)]
    pub uvs: Vec<Vec3>,
    pub faces: Vec<MemoryFace>,
}

impl MeshProvider for MemoryMesh {
    fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn normal_count(&self) -> usize {
        self.normals.len()
    }

    fn uv_count(&self) -> usize {
        self.uvs.len()
    }

    fn position(&self, index: u32) -> Option<Vec3> {
        self.positions.get(index as usize).copied()
    }

    fn normal(&self, index: u32) -> Option<Vec3> {
        self.normals.get(index as usize).copied()
    }

    fn uv(&self, index: u32) -> Option<Vec3> {
        self.uvs.get(index as usize).copied()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn face(&self, index: usize) -> Face {
        let f = &self.faces[index];
        Face { vertices: f.vertices, normals: f.normals, uvs: f.uvs }
    }

    fn face_material(&self, index: usize) -> Option<MaterialId> {
        self.faces[index].material
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Influence {
    pub bone: NodeId,
    #[serde(default = "one")]
    pub weight: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkinVertex {
    pub kind: VertexKind,
    pub influences: Vec<Influence>,
}

impl SkinVertex {
    pub fn rigid(bone: NodeId) -> Self {
        Self { kind: VertexKind::Rigid, influences: vec![Influence { bone, weight: 1.0 }] }
    }

    pub fn blended(influences: &[(NodeId, f32)]) -> Self {
        Self {
            kind: VertexKind::RigidBlended,
            influences: influences.iter().map(|&(bone, weight)| Influence { bone, weight }).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySkin {
    pub bones: Vec<NodeId>,
    pub vertices: Vec<SkinVertex>,
}

impl SkinProvider for MemorySkin {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone(&self, index: usize) -> NodeId {
        self.bones[index]
    }

    fn skinned_vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn vertex_kind(&self, vertex: usize) -> VertexKind {
        self.vertices[vertex].kind
    }

    fn vertex_bone_count(&self, vertex: usize) -> usize {
        self.vertices[vertex].influences.len()
    }

    fn vertex_bone(&self, vertex: usize, index: usize) -> NodeId {
        self.vertices[vertex].influences[index].bone
    }

    fn vertex_weight(&self, vertex: usize, index: usize) -> f32 {
        self.vertices[vertex].influences[index].weight
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Node-to-world transform.
    #[serde(default)]
    pub world: Affine3A,
    #[serde(default)]
    pub mesh: Option<MemoryMesh>,
    #[serde(default)]
    pub skin: Option<MemorySkin>,
}

impl MemoryNode {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            parent: None,
            world: Affine3A::IDENTITY,
            mesh: None,
            skin: None,
        }
    }

    pub fn with_world(mut self, world: Affine3A) -> Self {
        self.world = world;
        self
    }

    /// Attach geometry; the node becomes a mesh node.
    pub fn with_mesh(mut self, mesh: MemoryMesh) -> Self {
        self.kind = ObjectKind::Mesh;
        self.mesh = Some(mesh);
        self
    }

    pub fn with_skin(mut self, skin: MemorySkin) -> Self {
        self.skin = Some(skin);
        self
    }
}

/// Serialized form: materials and nodes only.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct SceneDescription {
    #[serde(default)]
    materials: Vec<Material>,
    #[serde(default)]
    nodes: Vec<MemoryNode>,
}

/// In-memory scene.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "SceneDescription", into = "SceneDescription")]
pub struct MemoryScene {
    nodes: Vec<MemoryNode>,
    materials: Vec<Material>,
    children: Vec<Vec<NodeId>>,
    top_level: Vec<NodeId>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON scene description.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add a node under `parent` (or at the top level) and return its handle.
    pub fn add_node(&mut self, mut node: MemoryNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(node);
        self.children.push(Vec::new());
        match parent {
            Some(p) => self.children[p.0].push(id),
            None => self.top_level.push(id),
        }
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &MemoryNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MemoryNode {
        &mut self.nodes[id.0]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Check that every handle points inside the scene and that parent
    /// links are acyclic.
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        let check_node = |id: NodeId, what: &str, owner: &str| {
            if id.0 < count {
                Ok(())
            } else {
                Err(Error::invalid_scene(format!("{owner}: {what} {} out of range", id.0)))
            }
        };

        for node in &self.nodes {
            if let Some(parent) = node.parent {
                check_node(parent, "parent", &node.name)?;
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            let mut steps = 0;
            let mut cursor = node.parent;
            while let Some(p) = cursor {
                steps += 1;
                if p.0 == i || steps > count {
                    return Err(Error::invalid_scene(format!("{}: parent cycle", node.name)));
                }
                cursor = self.nodes[p.0].parent;
            }

            if let Some(mesh) = &node.mesh {
                for face in &mesh.faces {
                    if let Some(m) = face.material {
                        if m.0 >= self.materials.len() {
                            return Err(Error::UnknownMaterial(m.0));
                        }
                    }
                }
            }

            if let Some(skin) = &node.skin {
                for &bone in &skin.bones {
                    check_node(bone, "bone", &node.name)?;
                }
                for vertex in &skin.vertices {
                    for influence in &vertex.influences {
                        check_node(influence.bone, "influence bone", &node.name)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn from_description(desc: SceneDescription) -> Result<Self> {
        let mut scene = Self {
            children: vec![Vec::new(); desc.nodes.len()],
            nodes: desc.nodes,
            materials: desc.materials,
            top_level: Vec::new(),
        };
        scene.validate()?;

        for (i, node) in scene.nodes.iter().enumerate() {
            match node.parent {
                Some(p) => scene.children[p.0].push(NodeId(i)),
                None => scene.top_level.push(NodeId(i)),
            }
        }
        Ok(scene)
    }
}

impl TryFrom<SceneDescription> for MemoryScene {
    type Error = Error;

    fn try_from(desc: SceneDescription) -> Result<Self> {
        Self::from_description(desc)
    }
}

impl From<MemoryScene> for SceneDescription {
    fn from(scene: MemoryScene) -> Self {
        Self { materials: scene.materials, nodes: scene.nodes }
    }
}

impl SceneProvider for MemoryScene {
    fn top_level_nodes(&self) -> Vec<NodeId> {
        self.top_level.clone()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children[node.0].clone()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].name
    }

    fn kind(&self, node: NodeId) -> ObjectKind {
        self.nodes[node.0].kind.clone()
    }

    fn world_transform(&self, node: NodeId) -> Affine3A {
        self.nodes[node.0].world
    }

    fn mesh(&self, node: NodeId) -> Option<&dyn MeshProvider> {
        self.nodes[node.0].mesh.as_ref().map(|m| m as &dyn MeshProvider)
    }

    fn skin(&self, node: NodeId) -> Option<&dyn SkinProvider> {
        self.nodes[node.0].skin.as_ref().map(|s| s as &dyn SkinProvider)
    }

    fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node_links_children() {
        let mut scene = MemoryScene::new();
        let root = scene.add_node(MemoryNode::new("root", ObjectKind::Group), None);
        let a = scene.add_node(MemoryNode::new("a", ObjectKind::Bone), Some(root));
        let b = scene.add_node(MemoryNode::new("b", ObjectKind::Helper), Some(root));

        assert_eq!(scene.top_level_nodes(), vec![root]);
        assert_eq!(scene.children(root), vec![a, b]);
        assert_eq!(scene.parent(b), Some(root));
        assert!(scene.is_helper(b));
        assert!(!scene.is_helper(a));
        assert_eq!(scene.find("a"), Some(a));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_parent_transform_defaults_to_parent_world() {
        let mut scene = MemoryScene::new();
        let offset = Affine3A::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let root = scene.add_node(MemoryNode::new("root", ObjectKind::Group).with_world(offset), None);
        let child = scene.add_node(MemoryNode::new("child", ObjectKind::Group), Some(root));
        assert_eq!(scene.parent_transform(child), offset);
        assert_eq!(scene.parent_transform(root), Affine3A::IDENTITY);
    }

    #[test]
    fn test_json_roundtrip() -> Result<()> {
        let json = r#"{
            "materials": [{ "name": "red", "diffuse": [1.0, 0.0, 0.0] }],
            "nodes": [
                { "name": "root" },
                {
                    "name": "tri",
                    "kind": "mesh",
                    "parent": 0,
                    "mesh": {
                        "positions": [[0,0,0], [1,0,0], [0,1,0]],
                        "normals": [[0,0,1]],
                        "faces": [{ "vertices": [0,1,2], "normals": [0,0,0], "uvs": [0,0,0], "material": 0 }]
                    }
                }
            ]
        }"#;
        let scene = MemoryScene::from_json_str(json)?;
        assert_eq!(scene.num_nodes(), 2);
        assert_eq!(scene.children(NodeId(0)), vec![NodeId(1)]);
        assert_eq!(scene.kind(NodeId(1)), ObjectKind::Mesh);
        assert_eq!(scene.material(MaterialId(0)).map(|m| m.opacity), Some(1.0));

        let mesh = scene.mesh(NodeId(1)).expect("mesh");
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face_material(0), Some(MaterialId(0)));
        assert_eq!(mesh.uv(0), None);

        let again = MemoryScene::from_json_str(&scene.to_json_string()?)?;
        assert_eq!(again.num_nodes(), 2);
        assert_eq!(again.node(NodeId(1)).mesh, scene.node(NodeId(1)).mesh);
        Ok(())
    }

    #[test]
    fn test_json_rejects_bad_parent() {
        let json = r#"{ "nodes": [ { "name": "a", "parent": 7 } ] }"#;
        assert!(matches!(MemoryScene::from_json_str(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_validate_rejects_cycle() {
        let mut scene = MemoryScene::new();
        let a = scene.add_node(MemoryNode::new("a", ObjectKind::Group), None);
        let b = scene.add_node(MemoryNode::new("b", ObjectKind::Group), Some(a));
        scene.node_mut(a).parent = Some(b);
        assert!(matches!(scene.validate(), Err(Error::InvalidScene(_))));
    }

    #[test]
    fn test_skin_vertex_helpers() {
        let v = SkinVertex::blended(&[(NodeId(1), 0.25), (NodeId(2), 0.75)]);
        let skin = MemorySkin { bones: vec![NodeId(1), NodeId(2)], vertices: vec![v, SkinVertex::rigid(NodeId(2))] };
        assert_eq!(skin.vertex_kind(0), VertexKind::RigidBlended);
        assert_eq!(skin.vertex_bone_count(0), 2);
        assert_eq!(skin.vertex_weight(0, 1), 0.75);
        assert_eq!(skin.vertex_kind(1), VertexKind::Rigid);
        assert_eq!(skin.vertex_bone(1, 0), NodeId(2));
    }
}
