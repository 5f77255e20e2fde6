//! Export pipeline (scene provider -> model -> .S64)
//!
//! Runs partitioning, deduplication, sampling and normalization in one pass
//! and renders the result. The provider's pose cursor is saved before
//! anything is read and restored on every exit path. Output is rendered in
//! memory first, so a failed export never leaves a partial file behind.

use std::path::Path;

use anyhow::{Context, Result};
use hashbrown::HashSet;
use s64_common::{to_s64_string, Model, UpAxis, WriteOptions, DEFAULT_ANIM_FPS, NONE_NAME};
use serde::Deserialize;

use crate::animation::sample_animations;
use crate::error::{ExportError, ExportWarning};
use crate::mesh::{check_model_size, optimize_vertices, partition_meshes};
use crate::normalize::{normalize, sort_faces_by_material};
use crate::provider::{ObjectFilter, PoseGuard, PoseMode, SceneProvider};

/// Largest accepted frame rate and export scale
const MAX_OPTION_VALUE: f32 = 1000.0;

/// User-facing export options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Split quads into triangles before processing
    pub triangulate: bool,
    /// Only export selected objects
    pub selected_only: bool,
    /// Only export visible objects
    pub visible_only: bool,
    /// Target playback rate; keyframe times scale by `30 / animation_fps`
    #[serde(alias = "fps")]
    pub animation_fps: f32,
    /// Uniform multiplier for positions and translations
    pub scale: f32,
    pub up_axis: UpAxis,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            triangulate: false,
            selected_only: false,
            visible_only: true,
            animation_fps: DEFAULT_ANIM_FPS as f32,
            scale: 1.0,
            up_axis: UpAxis::Z,
        }
    }
}

impl ExportOptions {
    /// Reject frame rates and scales outside `(0, 1000]`
    pub fn validate(&self) -> Result<(), ExportError> {
        check_range("animation_fps", self.animation_fps)?;
        check_range("scale", self.scale)?;
        Ok(())
    }

    pub fn filter(&self) -> ObjectFilter {
        ObjectFilter {
            selected_only: self.selected_only,
            visible_only: self.visible_only,
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            scale: self.scale,
            up_axis: self.up_axis,
        }
    }
}

fn check_range(name: &'static str, value: f32) -> Result<(), ExportError> {
    if value > 0.0 && value <= MAX_OPTION_VALUE {
        Ok(())
    } else {
        Err(ExportError::InvalidOption {
            name,
            value,
            expected: "a value in (0, 1000]",
        })
    }
}

/// A built model plus every warning raised while building it
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub model: Model,
    pub warnings: Vec<ExportWarning>,
}

/// Build the normalized model for everything `options` selects
pub fn build_model<P: SceneProvider>(
    provider: &mut P,
    options: &ExportOptions,
) -> Result<ExportOutput, ExportError> {
    options.validate()?;

    let mut warnings = Vec::new();
    let mut guard = PoseGuard::new(provider);
    guard.set_pose_mode(PoseMode::Rest);

    let filter = options.filter();
    let counts = guard.object_counts();
    let skeletons = guard.skeletons(&filter).map_err(ExportError::Provider)?;
    let meshes = guard
        .meshes(&filter, options.triangulate)
        .map_err(ExportError::Provider)?;

    if counts.meshes > 0 && meshes.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    if options.selected_only && counts.skeletons > 0 && skeletons.is_empty() {
        ExportWarning::NoSkeletonSelected.record(&mut warnings);
    }

    for mesh in &meshes {
        check_model_size(mesh, options.scale, &mut warnings);
    }

    let mut sub_meshes = partition_meshes(&skeletons, &meshes, &mut warnings)?;
    for mesh in &mut sub_meshes {
        sort_faces_by_material(mesh);
        optimize_vertices(mesh);
    }

    let model_bones: HashSet<String> = sub_meshes
        .iter()
        .filter(|m| m.name != NONE_NAME)
        .map(|m| m.name.clone())
        .collect();

    let actions = guard.actions().map_err(ExportError::Provider)?;
    let animations = sample_animations(
        &mut *guard,
        &skeletons,
        &actions,
        &model_bones,
        options.animation_fps,
        &mut warnings,
    )?;
    drop(guard);

    let mut model = Model {
        meshes: sub_meshes,
        animations,
    };
    normalize(&mut model);

    tracing::info!(
        "Built model: {} meshes, {} animations from {} skeletons and {} source meshes ({} warnings)",
        model.meshes.len(),
        model.animations.len(),
        skeletons.len(),
        meshes.len(),
        warnings.len()
    );

    Ok(ExportOutput { model, warnings })
}

/// Build and render to an in-memory `.S64` string
pub fn export_to_memory<P: SceneProvider>(
    provider: &mut P,
    options: &ExportOptions,
) -> Result<(String, ExportOutput)> {
    let output = build_model(provider, options)?;
    let text = to_s64_string(&output.model, &options.write_options())
        .context("Failed to render S64 output")?;
    Ok((text, output))
}

/// Build, render and write a `.S64` file
///
/// The file is only created once rendering succeeded.
pub fn export_to_file<P: SceneProvider>(
    provider: &mut P,
    options: &ExportOptions,
    output: &Path,
) -> Result<ExportOutput> {
    let (text, result) = export_to_memory(provider, options)?;

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(ExportError::from)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(output, text)
        .map_err(ExportError::from)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        "Exported {}: {} meshes, {} animations",
        output.display(),
        result.model.meshes.len(),
        result.model.animations.len()
    );

    Ok(result)
}
