//! Deterministic output ordering
//!
//! Pure reordering plus pruning of already-empty structures; nothing here can
//! fail.

use s64_common::{Model, SubMesh};

/// Stable sort of a sub-mesh's faces by material name
pub fn sort_faces_by_material(mesh: &mut SubMesh) {
    mesh.faces.sort_by(|a, b| a.material.cmp(&b.material));
}

/// Sort sub-meshes, faces and animations and drop empty entries
///
/// Keyframes are already ordered by time inside each animation.
pub fn normalize(model: &mut Model) {
    model.meshes.retain(|mesh| !mesh.is_empty());
    for mesh in &mut model.meshes {
        sort_faces_by_material(mesh);
    }
    model.meshes.sort_by(|a, b| a.name.cmp(&b.name));

    for animation in &mut model.animations {
        animation.prune_empty_frames();
    }
    model.animations.retain(|animation| !animation.is_empty());
    model.animations.sort_by(|a, b| a.name.cmp(&b.name));
}
