//! Integration tests for s64-export
//!
//! Tests the full pipeline: write scene file -> run CLI -> verify output

use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const ARM_SCENE: &str = r#"{
    "frame_current": 3,
    "skeletons": [{
        "name": "Armature",
        "selected": true,
        "bones": [
            { "name": "Root", "head": [0, 0, 0], "deform": false },
            { "name": "Arm", "parent": "Root", "head": [0, 1, 0], "properties": ["billboard"] }
        ]
    }],
    "meshes": [{
        "name": "Body",
        "vertex_groups": ["Arm"],
        "materials": ["Skin"],
        "vertices": [
            { "co": [0, 0, 0], "normal": [0, 0, 1], "groups": [[0, 1.0]] },
            { "co": [1, 0, 0], "normal": [0, 0, 1], "groups": [[0, 1.0]] },
            { "co": [1, 1, 0], "normal": [0, 0, 1], "groups": [[0, 1.0]] },
            { "co": [0, 1, 0], "normal": [0, 0, 1], "groups": [[0, 1.0]] }
        ],
        "polygons": [
            { "vertices": [0, 1, 2, 3], "uvs": [[0, 0], [1, 0], [1, 1], [0, 1]] }
        ]
    }],
    "actions": [
        {
            "name": "Lift",
            "channels": [
                { "bone": "Arm", "property": "location",
                  "keyframes": [{ "frame": 0, "value": [0, 0, 0] }, { "frame": 20, "value": [0, 0, 2] }] }
            ]
        },
        { "name": "Spare", "fake_user": true }
    ]
}"#;

fn s64_export(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_s64-export"))
        .args(args)
        .output()
        .expect("Failed to run s64-export")
}

fn write_scene(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, ARM_SCENE).expect("Failed to write scene");
    path
}

/// Test scene -> .S64 with default options
#[test]
fn test_export_scene() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path(), "arm.json");

    let result = s64_export(&["export", scene.to_str().unwrap()]);
    assert!(result.status.success(), "s64-export export command failed");

    let output = dir.path().join("arm.S64");
    let text = std::fs::read_to_string(&output).expect("Failed to read output");

    assert!(text.starts_with("/**********************************\n"));
    assert!(text.contains("BEGIN MESH Arm\nROOT 0.0000 1.0000 0.0000\nPROPERTIES billboard\n"));
    assert!(text.contains("4 0 1 2 3 Skin\n"));
    assert!(text.contains("0.0000 1.0000 0.0000 0.0000 0.0000 1.0000 1.0000 1.0000 1.0000 0.0000 0.0000\n"));
    assert!(text.contains("BEGIN ANIMATION Lift\n"));
    assert!(text.contains("BEGIN KEYFRAME 20\n"));
    assert!(text.contains("Arm 0.0000 0.0000 2.0000 1.0000 0.0000 0.0000 0.0000 1.0000 1.0000 1.0000\n"));
    assert!(!text.contains("Spare"));
}

/// Test option flags: triangulation, frame rate, scale and up axis
#[test]
fn test_export_with_options() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path(), "arm.json");
    let output = dir.path().join("out").join("arm_y.S64");

    let result = s64_export(&[
        "export",
        scene.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--triangulate",
        "--fps",
        "60",
        "--scale",
        "2",
        "--up-axis",
        "Y",
    ]);
    assert!(result.status.success(), "s64-export export command failed");

    let text = std::fs::read_to_string(&output).expect("Failed to read output");
    assert!(text.contains("ROOT 0.0000 0.0000 -2.0000\n"));
    assert!(text.contains("3 0 1 2 Skin\n3 0 2 3 Skin\n"));
    assert!(text.contains("BEGIN KEYFRAME 10\n"));
    assert!(text.contains("Arm 0.0000 4.0000 -0.0000 "));
}

/// Filtering everything out cancels the export without writing a file
#[test]
fn test_export_nothing_selected_fails() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path(), "arm.json");

    let result = s64_export(&["export", scene.to_str().unwrap(), "--selected-only"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("No mesh was exported"));
    assert!(!dir.path().join("arm.S64").exists());
}

/// Test manifest check and build
#[test]
fn test_manifest_build() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_scene(dir.path(), "hero.json");
    let manifest = dir.path().join("s64.toml");
    std::fs::write(
        &manifest,
        "[output]\ndir = \"build\"\n\n[[exports]]\nscene = \"hero.json\"\nup_axis = \"Y\"\n",
    )
    .expect("Failed to write manifest");

    let check = s64_export(&["check", manifest.to_str().unwrap()]);
    assert!(check.status.success(), "s64-export check command failed");

    let build = s64_export(&["build", manifest.to_str().unwrap()]);
    assert!(build.status.success(), "s64-export build command failed");

    let text = std::fs::read_to_string(dir.path().join("build").join("hero.S64"))
        .expect("Failed to read output");
    assert!(text.contains("ROOT 0.0000 0.0000 -1.0000\n"));
}

/// Check fails on a manifest naming a missing scene
#[test]
fn test_manifest_check_missing_scene() {
    let dir = tempdir().expect("Failed to create temp dir");
    let manifest = dir.path().join("s64.toml");
    std::fs::write(&manifest, "[[exports]]\nscene = \"ghost.json\"\n")
        .expect("Failed to write manifest");

    let check = s64_export(&["check", manifest.to_str().unwrap()]);
    assert!(!check.status.success());
}

/// List prints scene contents
#[test]
fn test_list_scene() {
    let dir = tempdir().expect("Failed to create temp dir");
    let scene = write_scene(dir.path(), "arm.json");

    let result = s64_export(&["list", scene.to_str().unwrap()]);
    assert!(result.status.success(), "s64-export list command failed");

    let log = String::from_utf8_lossy(&result.stdout);
    assert!(log.contains("'Armature': 2 bones (1 deforming)"));
    assert!(log.contains("'Body': 1 polygons"));
    assert!(log.contains("'Spare'"));
}
