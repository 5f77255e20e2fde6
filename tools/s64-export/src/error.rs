//! Export errors and warnings

/// Fatal export error. Nothing is written when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Bone in skeleton '{skeleton}' is named \"None\", which is reserved for unskinned geometry")]
    ReservedBoneName { skeleton: String },

    #[error(
        "Face {polygon} of mesh '{mesh}' has {count} vertices; faces must have 3 or 4 vertices"
    )]
    UnsupportedPolygon {
        mesh: String,
        polygon: usize,
        count: usize,
    },

    #[error("No mesh was exported with the selected options")]
    NothingToExport,

    #[error("Invalid export option {name} = {value} (expected {expected})")]
    InvalidOption {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("Scene provider failed: {0:#}")]
    Provider(#[source] anyhow::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable issue reported alongside a successful export
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExportWarning {
    #[error("Mesh '{mesh}' seems quite small (volume {volume:.4}), it might not render properly")]
    ModelTooSmall { mesh: String, volume: f32 },

    #[error("Vertex group '{0}' does not match any bone names, assuming None")]
    UnmatchedVertexGroup(String),

    #[error("Animation '{0}' was deleted because it was empty")]
    EmptyAnimation(String),

    #[error("No skeleton was exported with the selected options")]
    NoSkeletonSelected,
}

impl ExportWarning {
    /// Log the warning and append it to `warnings`
    pub(crate) fn record(self, warnings: &mut Vec<ExportWarning>) {
        tracing::warn!("{}", self);
        warnings.push(self);
    }
}
