//! Sausage64 text format (.S64)
//!
//! Line-oriented text: a comment header, one `MESH` block per bone
//! sub-mesh, then one `ANIMATION` block per clip. All numbers are written
//! with four decimal places; names are written as bare identifiers.
//!
//! # Layout
//! ```text
//! BEGIN MESH <ident>
//! ROOT <x> <y> <z>
//! PROPERTIES <prop> ...                  (only when the bone has any)
//! BEGIN VERTICES
//! <px> <py> <pz> <nx> <ny> <nz> <r> <g> <b> <u> <v>
//! END VERTICES
//! BEGIN FACES
//! <count> <i0> <i1> <i2> [<i3>] <material>
//! END FACES
//! END MESH <ident>
//!
//! BEGIN ANIMATION <ident>
//! BEGIN KEYFRAME <frame>
//! <bone> <px> <py> <pz> <qw> <qx> <qy> <qz> <sx> <sy> <sz>
//! END KEYFRAME <frame>
//! END ANIMATION <ident>
//! ```

mod s64;

pub use s64::{to_s64_string, write_s64, HEADER};

use glam::{Quat, Vec3};
use serde::Deserialize;
use std::str::FromStr;

/// File extension of character files
pub const S64_EXT: &str = "S64";

/// Frame rate animations are authored at; other rates rescale keyframe times
pub const DEFAULT_ANIM_FPS: f64 = 30.0;

/// Which axis points up in the written file
///
/// Models are authored Z-up. Y-up output maps `(x, y, z)` to `(x, z, -y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum UpAxis {
    #[default]
    #[serde(alias = "z")]
    Z,
    #[serde(alias = "y")]
    Y,
}

impl UpAxis {
    /// Name as accepted on the command line and in manifests
    pub fn as_str(self) -> &'static str {
        match self {
            UpAxis::Z => "Z",
            UpAxis::Y => "Y",
        }
    }

    /// Convert a position, normal or translation from the Z-up source
    pub fn convert_vector(self, v: Vec3) -> Vec3 {
        match self {
            UpAxis::Z => v,
            UpAxis::Y => Vec3::new(v.x, v.z, -v.y),
        }
    }

    /// Convert a rotation, returned as `[w, x, y, z]`
    pub fn convert_rotation(self, q: Quat) -> [f32; 4] {
        match self {
            UpAxis::Z => [q.w, q.x, q.y, q.z],
            UpAxis::Y => [q.w, q.x, q.z, -q.y],
        }
    }

    /// Convert a scale. Magnitudes are only reordered, never negated.
    pub fn convert_scale(self, s: Vec3) -> Vec3 {
        match self {
            UpAxis::Z => s,
            UpAxis::Y => Vec3::new(s.x, s.z, s.y),
        }
    }
}

/// Error returned when parsing an [`UpAxis`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid up axis '{0}' (expected Z or Y)")]
pub struct ParseUpAxisError(pub String);

impl FromStr for UpAxis {
    type Err = ParseUpAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Z" | "z" => Ok(UpAxis::Z),
            "Y" | "y" => Ok(UpAxis::Y),
            other => Err(ParseUpAxisError(other.to_string())),
        }
    }
}

/// Options applied while writing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteOptions {
    /// Uniform multiplier for positions, roots and translations
    pub scale: f32,
    pub up_axis: UpAxis,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            up_axis: UpAxis::Z,
        }
    }
}

/// Turn a bone, mesh or material name into a bare identifier
///
/// Every character outside letters, digits and `_` becomes `_`, and a
/// leading digit gets a `_` prefix.
pub fn sanitize_ident(name: &str) -> String {
    let mut ident = String::with_capacity(name.len() + 1);
    if name.chars().next().is_none_or(char::is_numeric) {
        ident.push('_');
    }
    ident.extend(
        name.chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }),
    );
    ident
}
