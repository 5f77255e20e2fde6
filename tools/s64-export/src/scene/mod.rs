//! Scene snapshot provider
//!
//! A JSON scene file standing in for a live authoring-tool session. It holds
//! skeletons, meshes and actions in the shape an exporter plugin would read
//! them, plus the mutable pose cursor (current frame, pose mode, active
//! actions) that sampling moves around.

pub mod file;
mod pose;

use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::{Mat4, Vec3};
use hashbrown::HashMap;

pub use file::SceneDoc;
use file::{MeshObject, PolygonDef, SkeletonObject};

use crate::provider::{
    Action, Bone, Corner, Curve, MeshSnapshot, ObjectCounts, ObjectFilter, Polygon, PoseMode,
    SceneProvider, Skeleton,
};

/// Custom property key the authoring tool uses for UI bookkeeping
const HIDDEN_PROPERTY: &str = "_RNA_UI";

/// Saved pose cursor of a [`SceneFile`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePoseState {
    pub frame: i32,
    pub mode: PoseMode,
    pub active_actions: Vec<Option<String>>,
}

/// Scene loaded from a JSON snapshot
#[derive(Debug, Clone)]
pub struct SceneFile {
    doc: SceneDoc,
    mode: PoseMode,
}

impl SceneFile {
    /// Load and validate a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load scene file: {}", path.display()))
    }

    /// Parse and validate scene JSON
    pub fn parse(content: &str) -> Result<Self> {
        let doc: SceneDoc = serde_json::from_str(content).context("Failed to parse scene JSON")?;
        let scene = Self {
            doc,
            mode: PoseMode::default(),
        };
        scene.validate()?;
        Ok(scene)
    }

    fn validate(&self) -> Result<()> {
        for skeleton in &self.doc.skeletons {
            for (index, bone) in skeleton.bones.iter().enumerate() {
                if let Some(parent) = &bone.parent
                    && !skeleton.bones[..index].iter().any(|b| &b.name == parent)
                {
                    bail!(
                        "Bone '{}' in skeleton '{}' must come after its parent '{}'",
                        bone.name,
                        skeleton.name,
                        parent
                    );
                }
            }
        }

        for action in &self.doc.actions {
            for channel in &action.channels {
                let frames = channel.keys.frames();
                if let Some(pair) = frames.windows(2).find(|pair| pair[1] < pair[0]) {
                    bail!(
                        "Keyframes of bone '{}' in action '{}' are out of order (frame {} after {})",
                        channel.bone,
                        action.name,
                        pair[1],
                        pair[0]
                    );
                }
            }
        }

        for mesh in &self.doc.meshes {
            let count = mesh.vertices.len();
            for (index, polygon) in mesh.polygons.iter().enumerate() {
                if let Some(&bad) = polygon.vertices.iter().find(|&&v| v as usize >= count) {
                    bail!(
                        "Polygon {} of mesh '{}' references vertex {} but the mesh has {} vertices",
                        index,
                        mesh.name,
                        bad,
                        count
                    );
                }
                let corners = polygon.vertices.len();
                let layers = [
                    ("normals", polygon.normals.as_ref().map(Vec::len)),
                    ("uvs", polygon.uvs.as_ref().map(Vec::len)),
                    ("colors", polygon.colors.as_ref().map(Vec::len)),
                ];
                for (layer, len) in layers {
                    if let Some(len) = len
                        && len != corners
                    {
                        bail!(
                            "Polygon {} of mesh '{}' has {} {} for {} corners",
                            index,
                            mesh.name,
                            len,
                            layer,
                            corners
                        );
                    }
                }
            }
        }

        Ok(())
    }

    pub fn doc(&self) -> &SceneDoc {
        &self.doc
    }

    pub fn frame_current(&self) -> i32 {
        self.doc.frame_current
    }

    pub fn pose_mode(&self) -> PoseMode {
        self.mode
    }

    pub fn active_action(&self, skeleton: &str) -> Option<&str> {
        self.doc
            .skeletons
            .iter()
            .find(|s| s.name == skeleton)
            .and_then(|s| s.active_action.as_deref())
    }
}

fn passes(filter: &ObjectFilter, selected: bool, visible: bool) -> bool {
    (!filter.selected_only || selected) && (!filter.visible_only || visible)
}

fn rest_matrices(skeleton: &SkeletonObject) -> Vec<Mat4> {
    skeleton
        .bones
        .iter()
        .map(|bone| match bone.matrix {
            Some(cols) => Mat4::from_cols_array(&cols),
            None => Mat4::from_translation(Vec3::from(bone.head)),
        })
        .collect()
}

fn to_skeleton(object: &SkeletonObject) -> Skeleton {
    let rest = rest_matrices(object);
    Skeleton {
        name: object.name.clone(),
        bones: object
            .bones
            .iter()
            .zip(rest)
            .map(|(bone, rest_matrix)| Bone {
                name: bone.name.clone(),
                head: Vec3::from(bone.head),
                rest_matrix,
                deform: bone.deform,
                properties: bone
                    .properties
                    .iter()
                    .filter(|p| p.as_str() != HIDDEN_PROPERTY)
                    .cloned()
                    .collect(),
            })
            .collect(),
    }
}

/// Split quads into two triangles fanned from the first corner
fn triangulate(polygon: &PolygonDef) -> Vec<PolygonDef> {
    if polygon.vertices.len() != 4 {
        return vec![polygon.clone()];
    }

    [[0usize, 1, 2], [0, 2, 3]]
        .iter()
        .map(|corners| PolygonDef {
            vertices: corners.iter().map(|&c| polygon.vertices[c]).collect(),
            material_index: polygon.material_index,
            normals: pick_corners(&polygon.normals, corners),
            uvs: pick_corners(&polygon.uvs, corners),
            colors: pick_corners(&polygon.colors, corners),
        })
        .collect()
}

fn pick_corners<T: Copy>(layer: &Option<Vec<T>>, corners: &[usize]) -> Option<Vec<T>> {
    layer
        .as_ref()
        .map(|values| corners.iter().map(|&c| values[c]).collect())
}

fn to_snapshot(object: &MeshObject, triangulate_quads: bool) -> MeshSnapshot {
    let polygons: Vec<PolygonDef> = if triangulate_quads {
        object.polygons.iter().flat_map(triangulate).collect()
    } else {
        object.polygons.clone()
    };

    MeshSnapshot {
        name: object.name.clone(),
        polygons: polygons
            .iter()
            .map(|polygon| Polygon {
                corners: polygon
                    .vertices
                    .iter()
                    .enumerate()
                    .map(|(corner, &v)| {
                        let vertex = &object.vertices[v as usize];
                        Corner {
                            position: vertex.co,
                            normal: polygon
                                .normals
                                .as_ref()
                                .map_or(vertex.normal, |n| n[corner]),
                            uv: polygon.uvs.as_ref().map(|uvs| uvs[corner]),
                            color: polygon.colors.as_ref().map(|c| c[corner].to_rgba()),
                            weights: vertex.groups.iter().copied().collect(),
                        }
                    })
                    .collect(),
                material_index: polygon.material_index,
            })
            .collect(),
        group_names: object
            .vertex_groups
            .iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.clone()))
            .collect::<HashMap<_, _>>(),
        material_slots: object.materials.clone(),
    }
}

impl SceneProvider for SceneFile {
    type PoseState = ScenePoseState;

    fn object_counts(&self) -> ObjectCounts {
        ObjectCounts {
            skeletons: self.doc.skeletons.len(),
            meshes: self.doc.meshes.len(),
        }
    }

    fn skeletons(&self, filter: &ObjectFilter) -> Result<Vec<Skeleton>> {
        Ok(self
            .doc
            .skeletons
            .iter()
            .filter(|s| passes(filter, s.selected, s.visible))
            .map(to_skeleton)
            .collect())
    }

    fn meshes(&self, filter: &ObjectFilter, triangulate: bool) -> Result<Vec<MeshSnapshot>> {
        Ok(self
            .doc
            .meshes
            .iter()
            .filter(|m| passes(filter, m.selected, m.visible))
            .map(|m| to_snapshot(m, triangulate))
            .collect())
    }

    fn actions(&self) -> Result<Vec<Action>> {
        Ok(self
            .doc
            .actions
            .iter()
            .map(|action| Action {
                name: action.name.clone(),
                fake_user: action.fake_user,
                curves: action
                    .channels
                    .iter()
                    .map(|channel| Curve {
                        bone: channel.bone.clone(),
                        keyframe_times: channel.keys.frames(),
                    })
                    .collect(),
            })
            .collect())
    }

    fn save_pose_state(&self) -> ScenePoseState {
        ScenePoseState {
            frame: self.doc.frame_current,
            mode: self.mode,
            active_actions: self
                .doc
                .skeletons
                .iter()
                .map(|s| s.active_action.clone())
                .collect(),
        }
    }

    fn restore_pose_state(&mut self, state: ScenePoseState) {
        self.doc.frame_current = state.frame;
        self.mode = state.mode;
        for (skeleton, action) in self.doc.skeletons.iter_mut().zip(state.active_actions) {
            skeleton.active_action = action;
        }
    }

    fn set_pose_mode(&mut self, mode: PoseMode) {
        self.mode = mode;
    }

    fn pose_at(&mut self, skeleton: &str, action: &str, frame: i32) -> Result<Vec<Mat4>> {
        let index = self
            .doc
            .skeletons
            .iter()
            .position(|s| s.name == skeleton)
            .with_context(|| format!("Skeleton '{}' not found in scene", skeleton))?;
        let action_def = self
            .doc
            .actions
            .iter()
            .find(|a| a.name == action)
            .with_context(|| format!("Action '{}' not found in scene", action))?;

        let object = &self.doc.skeletons[index];
        let rest = rest_matrices(object);
        let posed = match self.mode {
            PoseMode::Rest => rest,
            PoseMode::Pose => {
                let bases = pose::pose_bases(object, action_def, frame as f32);
                pose::compose(object, &rest, &bases)?
            }
        };

        self.doc.skeletons[index].active_action = Some(action.to_string());
        self.doc.frame_current = frame;
        Ok(posed)
    }
}
