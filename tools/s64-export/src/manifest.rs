//! Batch manifest parsing and build orchestration
//!
//! Parses `s64.toml` and exports every listed scene.
//!
//! ```toml
//! [output]
//! dir = "build/"
//!
//! [[exports]]
//! scene = "hero.json"
//! output = "hero.S64"
//! fps = 60.0
//! up_axis = "Y"
//! ```

use anyhow::{Context, Result};
use hashbrown::HashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use s64_common::S64_EXT;

use crate::error::ExportWarning;
use crate::pipeline::{export_to_file, ExportOptions};
use crate::scene::SceneFile;

/// Default manifest file name
pub const MANIFEST_NAME: &str = "s64.toml";

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub exports: Vec<ExportEntry>,
    /// Directory relative paths resolve against (the manifest's directory)
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    pub dir: Option<PathBuf>,
}

/// One scene to export
#[derive(Debug, Deserialize)]
pub struct ExportEntry {
    pub scene: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub options: ExportOptions,
}

/// Outcome of one manifest entry
#[derive(Debug, Clone)]
pub struct BuiltExport {
    pub output: PathBuf,
    pub warnings: Vec<ExportWarning>,
}

impl Manifest {
    /// Parse manifest from string; paths resolve against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(content).context("Failed to parse s64.toml")?;
        manifest.base_dir = base_dir.to_path_buf();
        Ok(manifest)
    }

    pub fn scene_path(&self, entry: &ExportEntry) -> PathBuf {
        self.base_dir.join(&entry.scene)
    }

    /// Where `entry` is written
    ///
    /// An explicit output dir (override, then `[output] dir`) holds every file;
    /// otherwise outputs sit next to the manifest, or next to the scene when
    /// the entry names no output.
    pub fn output_path(&self, entry: &ExportEntry, output_override: Option<&Path>) -> PathBuf {
        let dir = output_override
            .map(Path::to_path_buf)
            .or_else(|| self.output.dir.as_ref().map(|d| self.base_dir.join(d)));

        match (&entry.output, dir) {
            (Some(output), Some(dir)) => dir.join(output),
            (Some(output), None) => self.base_dir.join(output),
            (None, Some(dir)) => {
                let stem = entry.scene.file_stem().unwrap_or(entry.scene.as_os_str());
                dir.join(stem).with_extension(S64_EXT)
            }
            (None, None) => self.scene_path(entry).with_extension(S64_EXT),
        }
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    Manifest::parse(&content, base_dir)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.exports.is_empty() {
        tracing::warn!("Manifest lists no exports");
    }

    let mut outputs = HashSet::new();
    for entry in &manifest.exports {
        let scene = manifest.scene_path(entry);
        if !scene.exists() {
            anyhow::bail!("Scene not found: {}", scene.display());
        }
        entry
            .options
            .validate()
            .with_context(|| format!("Invalid options for {}", entry.scene.display()))?;

        let output = manifest.output_path(entry, None);
        if !outputs.insert(output.clone()) {
            anyhow::bail!("Output {} is written by more than one export", output.display());
        }
    }
    Ok(())
}

/// Export every entry of a manifest
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<Vec<BuiltExport>> {
    let mut built = Vec::with_capacity(manifest.exports.len());

    for entry in &manifest.exports {
        let scene_path = manifest.scene_path(entry);
        let output = manifest.output_path(entry, output_override);
        tracing::info!("Exporting: {} -> {}", scene_path.display(), output.display());

        let mut scene = SceneFile::load(&scene_path)?;
        let result = export_to_file(&mut scene, &entry.options, &output)
            .with_context(|| format!("Failed to export {}", scene_path.display()))?;

        built.push(BuiltExport {
            output,
            warnings: result.warnings,
        });
    }

    Ok(built)
}
