//! Skin weight resolution.
//!
//! Maps raw per-vertex bone influences onto a canonical bone list and lays
//! the resulting weights out in welded vertex order.
//!
//! Steps:
//! 1. every bone of the skin must share one root
//! 2. the bone list is a preorder walk from that root, with helper nodes
//!    and their subtrees pruned
//! 3. each influence climbs to its nearest listed ancestor; weights landing
//!    on the same bone are summed
//! 4. each vertex's weights are divided by their sum

use std::collections::HashMap;

use smallvec::SmallVec;

use super::weld::WeldedMesh;
use crate::scene::{NodeId, SceneProvider, SkinProvider, VertexKind};
use crate::util::{Error, Result};

/// `(bone index, weight)` pairs of one vertex, in first-resolved order.
pub type WeightVector = SmallVec<[(u32, f32); 4]>;

/// Resolved skin of one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Skin {
    /// Canonical bones in preorder.
    pub bones: Vec<NodeId>,
    /// Index of each bone's parent within `bones`; `None` for the root.
    pub parents: Vec<Option<u32>>,
    /// One vector per welded vertex, submeshes concatenated.
    pub weights: Vec<WeightVector>,
}

impl Skin {
    pub fn bone_index(&self, node: NodeId) -> Option<u32> {
        self.bones.iter().position(|&b| b == node).map(|i| i as u32)
    }
}

/// Builds a [`Skin`] for one mesh node.
pub struct SkinWeightBuilder<'a, S: SceneProvider + ?Sized> {
    scene: &'a S,
    mesh_name: &'a str,
}

impl<'a, S: SceneProvider + ?Sized> SkinWeightBuilder<'a, S> {
    pub fn new(scene: &'a S, mesh_name: &'a str) -> Self {
        Self { scene, mesh_name }
    }

    pub fn build(&self, skin: &dyn SkinProvider, mesh: &WeldedMesh) -> Result<Skin> {
        let _span = tracing::info_span!("skin", mesh = self.mesh_name).entered();

        if skin.bone_count() == 0 {
            return Err(Error::NoBones(self.mesh_name.to_string()));
        }
        if skin.skinned_vertex_count() != mesh.original_vertex_count {
            return Err(Error::VertexCountMismatch {
                mesh: self.mesh_name.to_string(),
                skin: skin.skinned_vertex_count(),
                geometry: mesh.original_vertex_count,
            });
        }

        let root = self.resolve_root(skin)?;
        let (bones, parents) = self.collect_bones(root);
        let index: HashMap<NodeId, u32> =
            bones.iter().enumerate().map(|(i, &b)| (b, i as u32)).collect();

        // Welded vertices that share a source position share its weights.
        let mut resolved: Vec<Option<WeightVector>> = vec![None; mesh.original_vertex_count];
        let mut weights = Vec::with_capacity(mesh.vertex_count());
        for original in mesh.original_indices() {
            let slot = &mut resolved[original as usize];
            if slot.is_none() {
                let mut vector = self.resolve_vertex(skin, original as usize, &index)?;
                normalize(&mut vector);
                *slot = Some(vector);
            }
            weights.extend(slot.clone());
        }

        tracing::debug!(bones = bones.len(), vertices = weights.len(), "resolved skin weights");
        Ok(Skin { bones, parents, weights })
    }

    /// Top-most ancestor shared by every bone of the skin, listed bones and
    /// vertex influences alike.
    pub fn resolve_root(&self, skin: &dyn SkinProvider) -> Result<NodeId> {
        let listed = (0..skin.bone_count()).map(|i| skin.bone(i));
        let influences = (0..skin.skinned_vertex_count())
            .flat_map(|v| (0..skin.vertex_bone_count(v)).map(move |i| skin.vertex_bone(v, i)));

        let mut root: Option<(NodeId, NodeId)> = None;
        for bone in listed.chain(influences) {
            let top = self.top_of(bone);
            match root {
                None => root = Some((top, bone)),
                Some((existing, first)) if existing != top => {
                    return Err(Error::MultipleRootBones {
                        mesh: self.mesh_name.to_string(),
                        first: self.scene.name(first).to_string(),
                        second: self.scene.name(bone).to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        root.map(|(top, _)| top).ok_or_else(|| Error::NoBones(self.mesh_name.to_string()))
    }

    fn top_of(&self, mut node: NodeId) -> NodeId {
        while let Some(parent) = self.scene.parent(node) {
            node = parent;
        }
        node
    }

    /// Preorder walk from `root`, skipping helper subtrees entirely.
    pub fn collect_bones(&self, root: NodeId) -> (Vec<NodeId>, Vec<Option<u32>>) {
        let mut bones = Vec::new();
        let mut parents = Vec::new();
        let mut stack: Vec<(NodeId, Option<u32>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            if self.scene.is_helper(node) {
                continue;
            }
            let index = bones.len() as u32;
            bones.push(node);
            parents.push(parent);
            for child in self.scene.children(node).into_iter().rev() {
                stack.push((child, Some(index)));
            }
        }
        (bones, parents)
    }

    /// Raw influences of one source vertex folded onto canonical bones.
    fn resolve_vertex(
        &self,
        skin: &dyn SkinProvider,
        vertex: usize,
        index: &HashMap<NodeId, u32>,
    ) -> Result<WeightVector> {
        let mut out = WeightVector::new();
        match skin.vertex_kind(vertex) {
            VertexKind::Rigid => {
                if skin.vertex_bone_count(vertex) == 0 {
                    return Err(Error::MissingInfluence { mesh: self.mesh_name.to_string(), vertex });
                }
                let bone = self.canonical_bone(skin.vertex_bone(vertex, 0), index)?;
                accumulate(&mut out, bone, 1.0);
            }
            VertexKind::RigidBlended => {
                for i in 0..skin.vertex_bone_count(vertex) {
                    let bone = self.canonical_bone(skin.vertex_bone(vertex, i), index)?;
                    accumulate(&mut out, bone, skin.vertex_weight(vertex, i));
                }
            }
            VertexKind::Other(kind) => {
                return Err(Error::UnknownVertexType { mesh: self.mesh_name.to_string(), vertex, kind });
            }
        }
        Ok(out)
    }

    /// Nearest listed node at or above `bone`.
    fn canonical_bone(&self, bone: NodeId, index: &HashMap<NodeId, u32>) -> Result<u32> {
        let mut cursor = Some(bone);
        while let Some(node) = cursor {
            if let Some(&i) = index.get(&node) {
                return Ok(i);
            }
            cursor = self.scene.parent(node);
        }
        Err(Error::UnresolvedBone {
            mesh: self.mesh_name.to_string(),
            bone: self.scene.name(bone).to_string(),
        })
    }
}

fn accumulate(vector: &mut WeightVector, bone: u32, weight: f32) {
    match vector.iter_mut().find(|(b, _)| *b == bone) {
        Some((_, w)) => *w += weight,
        None => vector.push((bone, weight)),
    }
}

/// Scale weights to sum to one. Vectors summing to zero are left alone.
pub fn normalize(vector: &mut WeightVector) {
    let sum: f32 = vector.iter().map(|(_, w)| w).sum();
    if sum != 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= sum;
        }
    }
}
