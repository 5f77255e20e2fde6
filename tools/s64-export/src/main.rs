//! s64-export - Sausage64 character export tool
//!
//! Converts skinned, animated scene snapshots to `.S64` text files

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use s64_export::manifest::{self, MANIFEST_NAME};
use s64_export::{list, ExportOptions, SceneFile, UpAxis, S64_EXT};

#[derive(Parser)]
#[command(name = "s64-export")]
#[command(about = "Sausage64 character export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a single scene file
    Export {
        /// Input scene (.json)
        input: PathBuf,

        /// Output .S64 file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Split quads into triangles
        #[arg(long)]
        triangulate: bool,

        /// Only export selected objects
        #[arg(long)]
        selected_only: bool,

        /// Only export visible objects
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        visible_only: bool,

        /// Animation playback rate
        #[arg(long, default_value_t = 30.0)]
        fps: f32,

        /// Uniform export scale
        #[arg(long, default_value_t = 1.0)]
        scale: f32,

        /// Up axis of the written file (Z or Y)
        #[arg(long, default_value = "Z")]
        up_axis: UpAxis,
    },

    /// Build every export listed in a manifest
    Build {
        /// Path to s64.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to s64.toml manifest
        #[arg(default_value = MANIFEST_NAME)]
        manifest: PathBuf,
    },

    /// List skeletons, meshes and actions of a scene
    List {
        /// Input scene (.json)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            triangulate,
            selected_only,
            visible_only,
            fps,
            scale,
            up_axis,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension(S64_EXT));
            let options = ExportOptions {
                triangulate,
                selected_only,
                visible_only,
                animation_fps: fps,
                scale,
                up_axis,
            };
            tracing::info!("Exporting {} -> {}", input.display(), output.display());

            let mut scene = SceneFile::load(&input)?;
            let result = s64_export::export_to_file(&mut scene, &options, &output)?;
            if result.warnings.is_empty() {
                tracing::info!("Done!");
            } else {
                tracing::info!("Done with {} warnings", result.warnings.len());
            }
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building exports from {}", manifest.display());
            }
            let config = manifest::load_manifest(&manifest)?;
            let built = manifest::build_all(&config, output.as_deref())?;
            let warnings: usize = built.iter().map(|b| b.warnings.len()).sum();
            tracing::info!(
                "Build complete! {} files, {} warnings",
                built.len(),
                warnings
            );
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {}", manifest.display());
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::List { input } => {
            list::list_scene(&input)?;
        }
    }

    Ok(())
}
