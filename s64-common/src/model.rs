//! Bone-partitioned character model
//!
//! Plain data produced by the export pipeline and consumed by the `.S64`
//! writer. Sub-meshes own their vertices and faces; animations own their
//! sampled keyframes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use smallvec::SmallVec;

/// Sub-mesh / material name used for geometry without a bone or material
pub const NONE_NAME: &str = "None";

/// A single exported vertex
///
/// Equality is exact component-wise comparison. Only true duplicates merge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Model-space position
    pub position: [f32; 3],
    /// Vertex (or custom split) normal
    pub normal: [f32; 3],
    /// RGBA color, opaque white when the source has no color layer
    pub color: [f32; 4],
    /// Texture coordinate with V already flipped, (0, 0) when absent
    pub uv: [f32; 2],
}

impl Vertex {
    /// Color used when the source mesh has no color layer
    pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// UV used when the source mesh has no UV layer
    pub const DEFAULT_UV: [f32; 2] = [0.0, 0.0];
}

/// A triangle or quad referencing vertices of its owning sub-mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Local vertex indices in winding order (3 or 4)
    pub indices: SmallVec<[u32; 4]>,
    /// Material name, [`NONE_NAME`] when unassigned
    pub material: String,
}

impl Face {
    pub fn new(indices: &[u32], material: impl Into<String>) -> Self {
        Self {
            indices: SmallVec::from_slice(indices),
            material: material.into(),
        }
    }
}

/// Geometry owned by a single bone (or [`NONE_NAME`] for unskinned geometry)
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    /// Bone name
    pub name: String,
    /// Bone rest head position (origin for unskinned geometry)
    pub root: Vec3,
    /// Vertices addressed by face indices
    pub vertices: Vec<Vertex>,
    /// Faces in output order
    pub faces: Vec<Face>,
    /// Distinct material names referenced by `faces`, in first-use order
    pub materials: Vec<String>,
    /// Custom property names inherited from the bone
    pub properties: Vec<String>,
}

impl SubMesh {
    pub fn new(name: impl Into<String>, root: Vec3) -> Self {
        Self {
            name: name.into(),
            root,
            vertices: Vec::new(),
            faces: Vec::new(),
            materials: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Append a vertex and return its local index
    pub fn push_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    /// Append a face, recording its material
    pub fn push_face(&mut self, face: Face) {
        if !self.materials.contains(&face.material) {
            self.materials.push(face.material.clone());
        }
        self.faces.push(face);
    }

    /// Whether both sub-meshes reference the same set of materials
    pub fn shares_materials(&self, other: &SubMesh) -> bool {
        self.materials.len() == other.materials.len()
            && self.materials.iter().all(|m| other.materials.contains(m))
    }

    /// A sub-mesh without faces is never written
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Keyframe time in target-rate frames
///
/// Totally ordered so it can key a [`BTreeMap`].
#[derive(Debug, Clone, Copy)]
pub struct FrameTime(pub f64);

impl FrameTime {
    /// Integer frame number as written to the file (truncated toward zero)
    pub fn frame_number(self) -> i64 {
        self.0.trunc() as i64
    }
}

impl PartialEq for FrameTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrameTime {}

impl PartialOrd for FrameTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrameTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A bone's deformation relative to its rest pose at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub bone: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// A named clip of sampled keyframes
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Frame time -> per-bone keyframes, ascending by time
    pub frames: BTreeMap<FrameTime, Vec<Keyframe>>,
}

impl Animation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: BTreeMap::new(),
        }
    }

    /// Register a frame time without any bone entries yet
    pub fn add_frame(&mut self, time: FrameTime) {
        self.frames.entry(time).or_default();
    }

    /// Store a keyframe, replacing an earlier entry for the same bone
    pub fn insert_keyframe(&mut self, time: FrameTime, keyframe: Keyframe) {
        let frame = self.frames.entry(time).or_default();
        match frame.iter_mut().find(|k| k.bone == keyframe.bone) {
            Some(existing) => *existing = keyframe,
            None => frame.push(keyframe),
        }
    }

    /// Drop frames with no bone entries, returning how many were removed
    pub fn prune_empty_frames(&mut self) -> usize {
        let before = self.frames.len();
        self.frames.retain(|_, bones| !bones.is_empty());
        before - self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Everything written to one `.S64` file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub meshes: Vec<SubMesh>,
    pub animations: Vec<Animation>,
}
