//! `.S64` writer

use anyhow::Result;
use glam::{DVec3, Vec3};
use std::io::Write;

use super::{sanitize_ident, WriteOptions};
use crate::model::{Animation, Model, SubMesh, NONE_NAME};

/// Comment block that opens every file
pub const HEADER: &str = "/**********************************
      Sausage64 Character Mesh
         Script by Buu342
            Version 1.1
**********************************/

";

/// Write a complete character file: header, meshes, then animations
///
/// Meshes and animations are written in the order given; normalize the
/// model first for reproducible output.
pub fn write_s64<W: Write>(w: &mut W, model: &Model, options: &WriteOptions) -> Result<()> {
    w.write_all(HEADER.as_bytes())?;

    for mesh in &model.meshes {
        write_mesh(w, mesh, options)?;
    }

    for animation in &model.animations {
        write_animation(w, animation, options)?;
    }

    Ok(())
}

/// Render a complete character file into a string
pub fn to_s64_string(model: &Model, options: &WriteOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_s64(&mut buffer, model, options)?;
    Ok(String::from_utf8(buffer)?)
}

/// Axis-convert then scale a position-like vector
///
/// Arithmetic is done in f64 so the scale multiply does not round twice.
fn placed(v: Vec3, options: &WriteOptions) -> DVec3 {
    options.up_axis.convert_vector(v).as_dvec3() * f64::from(options.scale)
}

fn write_mesh<W: Write>(w: &mut W, mesh: &SubMesh, options: &WriteOptions) -> Result<()> {
    let name = sanitize_ident(&mesh.name);
    writeln!(w, "BEGIN MESH {}", name)?;

    let root = placed(mesh.root, options);
    writeln!(w, "ROOT {:.4} {:.4} {:.4}", root.x, root.y, root.z)?;

    if !mesh.properties.is_empty() {
        writeln!(w, "PROPERTIES {}", mesh.properties.join(" "))?;
    }

    writeln!(w, "BEGIN VERTICES")?;
    for vertex in &mesh.vertices {
        let p = placed(Vec3::from(vertex.position), options);
        let n = options.up_axis.convert_vector(Vec3::from(vertex.normal));
        let [r, g, b, _] = vertex.color;
        let [u, v] = vertex.uv;
        writeln!(
            w,
            "{:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}",
            p.x, p.y, p.z, n.x, n.y, n.z, r, g, b, u, v
        )?;
    }
    writeln!(w, "END VERTICES")?;

    writeln!(w, "BEGIN FACES")?;
    for face in &mesh.faces {
        write!(w, "{}", face.indices.len())?;
        for index in &face.indices {
            write!(w, " {}", index)?;
        }
        let material = if face.material.is_empty() {
            NONE_NAME.to_string()
        } else {
            sanitize_ident(&face.material)
        };
        writeln!(w, " {}", material)?;
    }
    writeln!(w, "END FACES")?;

    writeln!(w, "END MESH {}\n", name)?;
    Ok(())
}

fn write_animation<W: Write>(w: &mut W, animation: &Animation, options: &WriteOptions) -> Result<()> {
    let name = sanitize_ident(&animation.name);
    writeln!(w, "BEGIN ANIMATION {}", name)?;

    for (time, keyframes) in &animation.frames {
        let frame = time.frame_number();
        writeln!(w, "BEGIN KEYFRAME {}", frame)?;
        for keyframe in keyframes {
            let t = placed(keyframe.translation, options);
            let [qw, qx, qy, qz] = options.up_axis.convert_rotation(keyframe.rotation);
            let s = options.up_axis.convert_scale(keyframe.scale);
            writeln!(
                w,
                "{} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4} {:.4}",
                sanitize_ident(&keyframe.bone),
                t.x,
                t.y,
                t.z,
                qw,
                qx,
                qy,
                qz,
                s.x,
                s.y,
                s.z
            )?;
        }
        writeln!(w, "END KEYFRAME {}", frame)?;
    }

    writeln!(w, "END ANIMATION {}\n", name)?;
    Ok(())
}
