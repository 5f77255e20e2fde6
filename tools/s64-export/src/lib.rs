//! s64-export library
//!
//! Converts skinned, animated characters into Sausage64 `.S64` files. Scene
//! data comes from a [`SceneProvider`]; [`SceneFile`] reads JSON scene
//! snapshots.

pub mod animation;
pub mod error;
pub mod list;
pub mod manifest;
pub mod mesh;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod scene;

// Re-export the model and writer from s64-common
pub use s64_common::{
    sanitize_ident, to_s64_string, write_s64, Model, SubMesh, UpAxis, WriteOptions, S64_EXT,
};

pub use error::{ExportError, ExportWarning};
pub use pipeline::{build_model, export_to_file, export_to_memory, ExportOptions, ExportOutput};
pub use provider::{
    Action, Bone, Corner, Curve, MeshSnapshot, ObjectCounts, ObjectFilter, Polygon, PoseGuard,
    PoseMode, SceneProvider, Skeleton,
};
pub use scene::SceneFile;
