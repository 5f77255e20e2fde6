//! Vertex deduplication and reindexing
//!
//! Corners are pushed into sub-meshes one vertex per face corner, so shared
//! vertices appear many times. Merging keeps the first occurrence and
//! redirects faces to it; reindexing then renumbers vertices by first use
//! in face order so the stored vertex list is dense.

use s64_common::SubMesh;

/// Collapse exact duplicate vertices, returning how many were removed
///
/// Faces referencing a removed vertex are redirected to the first identical
/// one. Comparison is exact, so the scan is quadratic in vertex count.
pub fn merge_duplicate_vertices(mesh: &mut SubMesh) -> usize {
    let count = mesh.vertices.len();
    let mut remap: Vec<u32> = (0..count as u32).collect();

    for i in 0..count {
        if remap[i] != i as u32 {
            continue;
        }
        for j in (i + 1)..count {
            if remap[j] == j as u32 && mesh.vertices[j] == mesh.vertices[i] {
                remap[j] = i as u32;
            }
        }
    }

    let removed = remap
        .iter()
        .enumerate()
        .filter(|&(i, &target)| target != i as u32)
        .count();
    if removed == 0 {
        return 0;
    }

    for face in &mut mesh.faces {
        for index in face.indices.iter_mut() {
            *index = remap[*index as usize];
        }
    }
    reindex_vertices(mesh);
    removed
}

/// Renumber vertices in first-use order over the face list
///
/// Vertices no face references are dropped.
pub fn reindex_vertices(mesh: &mut SubMesh) {
    let mut new_index: Vec<Option<u32>> = vec![None; mesh.vertices.len()];
    let mut vertices = Vec::with_capacity(mesh.vertices.len());

    for face in &mut mesh.faces {
        for index in face.indices.iter_mut() {
            let old = *index as usize;
            *index = *new_index[old].get_or_insert_with(|| {
                vertices.push(mesh.vertices[old]);
                (vertices.len() - 1) as u32
            });
        }
    }

    mesh.vertices = vertices;
}

/// Deduplicate then reindex a sub-mesh
pub fn optimize_vertices(mesh: &mut SubMesh) {
    let before = mesh.vertices.len();
    let removed = merge_duplicate_vertices(mesh);
    if removed == 0 {
        reindex_vertices(mesh);
    }
    tracing::debug!(
        "Sub-mesh '{}': {} -> {} vertices",
        mesh.name,
        before,
        mesh.vertices.len()
    );
}
