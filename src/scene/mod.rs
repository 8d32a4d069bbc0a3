//! Scene access for the exporter.
//!
//! The exporter never talks to a host application directly. It reads the
//! scene through three narrow capability traits:
//! - [`SceneProvider`] - node hierarchy, transforms, materials
//! - [`MeshProvider`] - triangulated faces and their attribute arrays
//! - [`SkinProvider`] - per-vertex bone influences
//!
//! [`MemoryScene`] implements all three over plain data and can be loaded
//! from JSON.

mod material;
mod memory;

pub use material::{Material, Texture};
pub use memory::{Influence, MemoryFace, MemoryMesh, MemoryNode, MemoryScene, MemorySkin, SkinVertex};

use serde::{Deserialize, Serialize};

use crate::util::{Affine3A, Vec3};

/// Handle of a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Handle of a material, stable for the duration of one export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub usize);

/// What a scene node carries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Plain transform with no object attached.
    #[default]
    Group,
    Mesh,
    Bone,
    /// Dummy/point object; pruned from skin bone lists.
    Helper,
    Camera,
    Light,
    /// Anything else the host reports, by class name.
    Unsupported(String),
}

impl ObjectKind {
    pub fn name(&self) -> &str {
        match self {
            Self::Group => "group",
            Self::Mesh => "mesh",
            Self::Bone => "bone",
            Self::Helper => "helper",
            Self::Camera => "camera",
            Self::Light => "light",
            Self::Unsupported(class) => class,
        }
    }
}

/// One triangle: position, normal and uv indices for each corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [u32; 3],
    pub normals: [u32; 3],
    pub uvs: [u32; 3],
}

/// How a skinned vertex is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    /// One bone, implicit weight 1.0.
    Rigid,
    /// Several bones with explicit weights.
    RigidBlended,
    /// Host-specific binding the exporter does not support.
    Other(u32),
}

/// Node hierarchy and per-node data.
pub trait SceneProvider {
    fn top_level_nodes(&self) -> Vec<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn name(&self, node: NodeId) -> &str;
    fn kind(&self, node: NodeId) -> ObjectKind;

    fn is_helper(&self, node: NodeId) -> bool {
        self.kind(node) == ObjectKind::Helper
    }

    fn world_transform(&self, node: NodeId) -> Affine3A;

    /// World transform of the parent, identity at the top level.
    fn parent_transform(&self, node: NodeId) -> Affine3A {
        self.parent(node)
            .map(|p| self.world_transform(p))
            .unwrap_or(Affine3A::IDENTITY)
    }

    fn mesh(&self, node: NodeId) -> Option<&dyn MeshProvider>;
    fn skin(&self, node: NodeId) -> Option<&dyn SkinProvider>;
    fn material(&self, id: MaterialId) -> Option<&Material>;
}

/// Triangulated geometry of one mesh node.
///
/// Attribute lookups return `None` for indices past the end of their array.
pub trait MeshProvider {
    /// Pre-welding position count.
    fn vertex_count(&self) -> usize;
    fn normal_count(&self) -> usize;
    fn uv_count(&self) -> usize;

    fn position(&self, index: u32) -> Option<Vec3>;
    fn normal(&self, index: u32) -> Option<Vec3>;
    fn uv(&self, index: u32) -> Option<Vec3>;

    fn face_count(&self) -> usize;
    fn face(&self, index: usize) -> Face;
    fn face_material(&self, index: usize) -> Option<MaterialId>;
}

/// Bone bindings of one skinned mesh, indexed by pre-welding vertex.
pub trait SkinProvider {
    fn bone_count(&self) -> usize;
    fn bone(&self, index: usize) -> NodeId;

    fn skinned_vertex_count(&self) -> usize;
    fn vertex_kind(&self, vertex: usize) -> VertexKind;
    fn vertex_bone_count(&self, vertex: usize) -> usize;
    fn vertex_bone(&self, vertex: usize, index: usize) -> NodeId;
    fn vertex_weight(&self, vertex: usize, index: usize) -> f32;
}
