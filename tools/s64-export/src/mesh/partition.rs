//! Dominant-weight bone partitioning
//!
//! Every face lands in exactly one sub-mesh. A corner votes for a bone when
//! one of its vertex weights is strictly above one half and names a known
//! deforming bone; the last vote in winding order decides the face, and with
//! no vote the face goes to the unskinned `None` sub-mesh. Vertices are
//! never split or blended across sub-meshes.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use s64_common::{Face, SubMesh, Vertex, NONE_NAME};
use smallvec::SmallVec;

use super::types::{BoneId, DOMINANT_WEIGHT, MAX_FACE_VERTICES, MIN_FACE_VERTICES, NONE_BONE};
use crate::error::{ExportError, ExportWarning};
use crate::provider::{Corner, MeshSnapshot, Polygon, Skeleton};

/// Sub-meshes indexed by bone id, with a name lookup built once
#[derive(Debug)]
pub struct BonePartition {
    meshes: Vec<SubMesh>,
    ids: HashMap<String, BoneId>,
    warned_groups: HashSet<String>,
}

impl BonePartition {
    /// Seed the unskinned sub-mesh plus one sub-mesh per deforming bone
    pub fn from_skeletons(skeletons: &[Skeleton]) -> Result<Self, ExportError> {
        let mut partition = Self {
            meshes: vec![SubMesh::new(NONE_NAME, Vec3::ZERO)],
            ids: HashMap::new(),
            warned_groups: HashSet::new(),
        };
        partition.ids.insert(NONE_NAME.to_string(), NONE_BONE);

        for skeleton in skeletons {
            for bone in skeleton.bones.iter().filter(|b| b.deform) {
                if bone.name == NONE_NAME {
                    return Err(ExportError::ReservedBoneName {
                        skeleton: skeleton.name.clone(),
                    });
                }

                let mut mesh = SubMesh::new(bone.name.clone(), bone.head);
                mesh.properties = bone.properties.clone();

                // A bone name seen in an earlier skeleton is redefined
                match partition.ids.get(&bone.name) {
                    Some(&id) => partition.meshes[id] = mesh,
                    None => {
                        partition.ids.insert(bone.name.clone(), partition.meshes.len());
                        partition.meshes.push(mesh);
                    }
                }
            }
        }

        Ok(partition)
    }

    pub fn bone_id(&self, name: &str) -> Option<BoneId> {
        self.ids.get(name).copied()
    }

    pub fn sub_mesh(&self, id: BoneId) -> Option<&SubMesh> {
        self.meshes.get(id)
    }

    /// Bone a vertex with these weights belongs to, if any
    ///
    /// Groups that carry a dominant weight but match no deforming bone are
    /// reported once per group name.
    pub fn dominant_bone(
        &mut self,
        weights: &[(u32, f32)],
        group_names: &HashMap<u32, String>,
        warnings: &mut Vec<ExportWarning>,
    ) -> Option<BoneId> {
        let mut bone = None;
        for &(group, weight) in weights {
            if weight <= DOMINANT_WEIGHT {
                continue;
            }
            let Some(name) = group_names.get(&group) else {
                continue;
            };
            match self.ids.get(name) {
                Some(&id) => bone = Some(id),
                None => {
                    if self.warned_groups.insert(name.clone()) {
                        ExportWarning::UnmatchedVertexGroup(name.clone()).record(warnings);
                    }
                }
            }
        }
        bone
    }

    /// Distribute every polygon of `snapshot` to its sub-mesh
    pub fn add_mesh(
        &mut self,
        snapshot: &MeshSnapshot,
        warnings: &mut Vec<ExportWarning>,
    ) -> Result<(), ExportError> {
        for (index, polygon) in snapshot.polygons.iter().enumerate() {
            self.add_polygon(snapshot, index, polygon, warnings)?;
        }
        Ok(())
    }

    fn add_polygon(
        &mut self,
        snapshot: &MeshSnapshot,
        index: usize,
        polygon: &Polygon,
        warnings: &mut Vec<ExportWarning>,
    ) -> Result<(), ExportError> {
        let count = polygon.corners.len();
        if !(MIN_FACE_VERTICES..=MAX_FACE_VERTICES).contains(&count) {
            return Err(ExportError::UnsupportedPolygon {
                mesh: snapshot.name.clone(),
                polygon: index,
                count,
            });
        }

        let mut owner = NONE_BONE;
        for corner in &polygon.corners {
            if let Some(id) = self.dominant_bone(&corner.weights, &snapshot.group_names, warnings) {
                owner = id;
            }
        }

        let material = resolve_material(snapshot, polygon.material_index);
        let target = &mut self.meshes[owner];
        let indices: SmallVec<[u32; 4]> = polygon
            .corners
            .iter()
            .map(|corner| target.push_vertex(corner_vertex(corner)))
            .collect();
        target.push_face(Face { indices, material });

        Ok(())
    }

    /// Sub-meshes that received at least one face, in creation order
    pub fn into_sub_meshes(self) -> Vec<SubMesh> {
        self.meshes.into_iter().filter(|m| !m.is_empty()).collect()
    }
}

/// Partition all mesh snapshots by dominant bone
pub fn partition_meshes(
    skeletons: &[Skeleton],
    meshes: &[MeshSnapshot],
    warnings: &mut Vec<ExportWarning>,
) -> Result<Vec<SubMesh>, ExportError> {
    let mut partition = BonePartition::from_skeletons(skeletons)?;
    for snapshot in meshes {
        partition.add_mesh(snapshot, warnings)?;
        tracing::debug!(
            "Partitioned mesh '{}': {} polygons",
            snapshot.name,
            snapshot.polygons.len()
        );
    }
    Ok(partition.into_sub_meshes())
}

fn corner_vertex(corner: &Corner) -> Vertex {
    Vertex {
        position: corner.position,
        normal: corner.normal,
        color: corner.color.unwrap_or(Vertex::DEFAULT_COLOR),
        uv: corner.uv.map_or(Vertex::DEFAULT_UV, |[u, v]| [u, 1.0 - v]),
    }
}

fn resolve_material(snapshot: &MeshSnapshot, slot: usize) -> String {
    snapshot
        .material_slots
        .get(slot)
        .filter(|name| !name.is_empty())
        .map_or_else(|| NONE_NAME.to_string(), Clone::clone)
}
