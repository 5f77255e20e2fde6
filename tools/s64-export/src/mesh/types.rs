//! Types and constants for mesh conversion

/// Index of a sub-mesh in a [`BonePartition`](super::BonePartition)
pub type BoneId = usize;

/// Sub-mesh id of unskinned geometry
pub(crate) const NONE_BONE: BoneId = 0;

/// A vertex belongs to a bone only when its weight strictly exceeds this
pub(crate) const DOMINANT_WEIGHT: f32 = 0.5;

/// Corner counts a face may have
pub(crate) const MIN_FACE_VERTICES: usize = 3;
pub(crate) const MAX_FACE_VERTICES: usize = 4;

/// Meshes enclosing less than `SMALL_MODEL_VOLUME / scale` are reported as small
pub(crate) const SMALL_MODEL_VOLUME: f32 = 10000.0;
