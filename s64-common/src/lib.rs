//! Shared types for Sausage64 character export
//!
//! This crate provides the pieces shared between:
//! - `s64-export` (conversion pipeline and CLI)
//! - anything else that wants to build or write `.S64` files
//!
//! # Modules
//!
//! - [`model`] - Bone-partitioned geometry and sampled animation data
//! - [`formats`] - The `.S64` text format writer and axis conversion

pub mod formats;
pub mod model;

// Re-export commonly used model items
pub use model::{Animation, Face, FrameTime, Keyframe, Model, SubMesh, Vertex, NONE_NAME};

// Re-export commonly used format items
pub use formats::{
    sanitize_ident, to_s64_string, write_s64, ParseUpAxisError, UpAxis, WriteOptions,
    DEFAULT_ANIM_FPS, S64_EXT,
};
