//! Mesh conversion (scene snapshots -> bone sub-meshes)

mod dedup;
mod partition;
mod types;
mod volume;

// Re-export public API
pub use dedup::{merge_duplicate_vertices, optimize_vertices, reindex_vertices};
pub use partition::{partition_meshes, BonePartition};
pub use types::BoneId;
pub use volume::{check_model_size, mesh_volume};
