//! On-disk scene snapshot layout (JSON)

use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// Root of a scene snapshot file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDoc {
    /// Current frame of the scene's timeline
    #[serde(default)]
    pub frame_current: i32,
    #[serde(default)]
    pub skeletons: Vec<SkeletonObject>,
    #[serde(default)]
    pub meshes: Vec<MeshObject>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkeletonObject {
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Action currently assigned to the skeleton
    #[serde(default)]
    pub active_action: Option<String>,
    pub bones: Vec<BoneDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoneDef {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Rest head in armature space
    pub head: [f32; 3],
    /// Column-major armature-space rest matrix; a translation to `head` when absent
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    #[serde(default = "default_true")]
    pub deform: bool,
    #[serde(default)]
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshObject {
    pub name: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Vertex group names, indexed by group id
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    /// Material name per slot; empty for an empty slot
    #[serde(default)]
    pub materials: Vec<String>,
    pub vertices: Vec<VertexDef>,
    pub polygons: Vec<PolygonDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexDef {
    pub co: [f32; 3],
    #[serde(default)]
    pub normal: [f32; 3],
    /// `(group id, weight)` pairs
    #[serde(default)]
    pub groups: Vec<(u32, f32)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolygonDef {
    pub vertices: Vec<u32>,
    #[serde(default)]
    pub material_index: usize,
    /// Custom split normals, one per corner
    #[serde(default)]
    pub normals: Option<Vec<[f32; 3]>>,
    /// One per corner, V not flipped
    #[serde(default)]
    pub uvs: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    pub colors: Option<Vec<ColorDef>>,
}

/// Corner color; RGB gets an opaque alpha
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ColorDef {
    Rgba([f32; 4]),
    Rgb([f32; 3]),
}

impl ColorDef {
    pub fn to_rgba(self) -> [f32; 4] {
        match self {
            ColorDef::Rgba(c) => c,
            ColorDef::Rgb([r, g, b]) => [r, g, b, 1.0],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDef {
    pub name: String,
    #[serde(default)]
    pub fake_user: bool,
    #[serde(default)]
    pub channels: Vec<ChannelDef>,
}

/// Keyframes of one bone property
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDef {
    pub bone: String,
    #[serde(flatten)]
    pub keys: ChannelKeys,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "property", content = "keyframes", rename_all = "snake_case")]
pub enum ChannelKeys {
    Location(Vec<Key<[f32; 3]>>),
    /// Quaternion keys in `w x y z` order
    RotationQuaternion(Vec<Key<[f32; 4]>>),
    Scale(Vec<Key<[f32; 3]>>),
}

impl ChannelKeys {
    pub fn frames(&self) -> Vec<f32> {
        match self {
            ChannelKeys::Location(keys) | ChannelKeys::Scale(keys) => {
                keys.iter().map(|k| k.frame).collect()
            }
            ChannelKeys::RotationQuaternion(keys) => keys.iter().map(|k| k.frame).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Key<T> {
    pub frame: f32,
    pub value: T,
}
