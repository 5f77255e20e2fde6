//! Small-model check
//!
//! Models authored at a tiny scale lose precision once written with four
//! decimals, so the exporter warns about meshes whose enclosed volume is
//! small relative to the export scale.

use glam::Vec3;

use super::types::SMALL_MODEL_VOLUME;
use crate::error::ExportWarning;
use crate::provider::MeshSnapshot;

/// Enclosed volume of a mesh snapshot
///
/// Sums signed tetrahedra against the origin over a fan of every polygon.
/// Only meaningful for closed meshes; open meshes still give a number.
pub fn mesh_volume(mesh: &MeshSnapshot) -> f32 {
    let mut volume = 0.0f64;
    for polygon in &mesh.polygons {
        let Some(first) = polygon.corners.first() else {
            continue;
        };
        let p0 = Vec3::from(first.position).as_dvec3();
        for pair in polygon.corners[1..].windows(2) {
            let p1 = Vec3::from(pair[0].position).as_dvec3();
            let p2 = Vec3::from(pair[1].position).as_dvec3();
            volume += p0.dot(p1.cross(p2)) / 6.0;
        }
    }
    volume.abs() as f32
}

/// Warn when `mesh` is small for the chosen export scale
pub fn check_model_size(mesh: &MeshSnapshot, scale: f32, warnings: &mut Vec<ExportWarning>) {
    let volume = mesh_volume(mesh);
    if volume < SMALL_MODEL_VOLUME / scale {
        ExportWarning::ModelTooSmall {
            mesh: mesh.name.clone(),
            volume,
        }
        .record(warnings);
    }
}
