//! Scene inspection for the `list` command

use anyhow::Result;
use std::path::Path;

use crate::animation::keyframe_times;
use crate::provider::{ObjectFilter, SceneProvider};
use crate::scene::SceneFile;

/// Log the skeletons, meshes and actions of a scene file
pub fn list_scene(input: &Path) -> Result<()> {
    let scene = SceneFile::load(input)?;
    let everything = ObjectFilter {
        selected_only: false,
        visible_only: false,
    };

    let skeletons = scene.skeletons(&everything)?;
    if skeletons.is_empty() {
        tracing::info!("No skeletons found in {}", input.display());
    } else {
        tracing::info!("Skeletons in {}:", input.display());
        for (i, skeleton) in skeletons.iter().enumerate() {
            let deforming = skeleton.bones.iter().filter(|b| b.deform).count();
            tracing::info!(
                "  [{}] '{}': {} bones ({} deforming)",
                i,
                skeleton.name,
                skeleton.bones.len(),
                deforming
            );
        }
    }

    let meshes = scene.meshes(&everything, false)?;
    if meshes.is_empty() {
        tracing::info!("No meshes found in {}", input.display());
    } else {
        tracing::info!("Meshes in {}:", input.display());
        for (i, (mesh, object)) in meshes.iter().zip(&scene.doc().meshes).enumerate() {
            tracing::info!(
                "  [{}] '{}': {} polygons, {} vertex groups{}{}",
                i,
                mesh.name,
                mesh.polygons.len(),
                mesh.group_names.len(),
                if object.selected { ", selected" } else { "" },
                if object.visible { "" } else { ", hidden" }
            );
        }
    }

    let actions = scene.actions()?;
    if actions.is_empty() {
        tracing::info!("No actions found in {}", input.display());
        return Ok(());
    }

    tracing::info!("Actions in {}:", input.display());
    for (i, action) in actions.iter().enumerate() {
        let times = keyframe_times(action);
        let range = match (times.first(), times.last()) {
            (Some(first), Some(last)) => format!("frames {}..{}", first, last),
            _ => "no keyframes".to_string(),
        };
        tracing::info!(
            "  [{}] '{}': {} curves, {}{}",
            i,
            action.name,
            action.curves.len(),
            range,
            if action.fake_user { " (fake user, skipped)" } else { "" }
        );
    }

    Ok(())
}
