//! Animation sampler (actions -> per-bone keyframes)
//!
//! Every action that is not only kept alive by a fake user is sampled at the
//! union of its curves' keyframe times. Times are remapped from the source
//! rate to the target playback rate by `DEFAULT_ANIM_FPS / fps`. At each time
//! the skeleton is posed through the provider and every bone that owns
//! geometry gets its deformation relative to its own rest pivot.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashSet;
use s64_common::{Animation, FrameTime, Keyframe, DEFAULT_ANIM_FPS};

use crate::error::{ExportError, ExportWarning};
use crate::provider::{Action, PoseMode, SceneProvider, Skeleton};

/// Distinct keyframe times over all curves of an action, ascending
pub fn keyframe_times(action: &Action) -> Vec<f32> {
    let mut times: Vec<f32> = action
        .curves
        .iter()
        .flat_map(|curve| curve.keyframe_times.iter().copied())
        .collect();
    times.sort_by(f32::total_cmp);
    times.dedup();
    times
}

/// Remap a source frame to the target playback rate
pub fn target_frame(source: f32, fps: f32) -> FrameTime {
    FrameTime(source as f64 * (DEFAULT_ANIM_FPS / fps as f64))
}

/// Deformation of a bone relative to its rest pivot
///
/// Computes `translate(-head) * (posed * rest^-1) * translate(head)` and
/// splits it into translation, rotation (with `w >= 0`) and scale.
pub fn bone_deformation(head: Vec3, rest: Mat4, posed: Mat4) -> (Vec3, Quat, Vec3) {
    let local = Mat4::from_translation(-head)
        * (posed * rest.inverse())
        * Mat4::from_translation(head);
    let (scale, rotation, translation) = local.to_scale_rotation_translation();
    let rotation = if rotation.w < 0.0 { -rotation } else { rotation };
    (translation, rotation, scale)
}

/// Sample every eligible action over every skeleton
///
/// `model_bones` names the bones that own a written sub-mesh; other bones get
/// no keyframes. Frames without any bone entry are dropped, and an action
/// left without frames is dropped with a warning.
pub fn sample_animations<P: SceneProvider>(
    provider: &mut P,
    skeletons: &[Skeleton],
    actions: &[Action],
    model_bones: &HashSet<String>,
    fps: f32,
    warnings: &mut Vec<ExportWarning>,
) -> Result<Vec<Animation>, ExportError> {
    if !skeletons.is_empty() {
        provider.set_pose_mode(PoseMode::Pose);
    }

    let mut animations = Vec::new();
    for action in actions {
        if action.fake_user {
            tracing::debug!("Skipping fake-user action '{}'", action.name);
            continue;
        }

        let mut animation = Animation::new(action.name.clone());
        let times = keyframe_times(action);
        for skeleton in skeletons {
            sample_skeleton(provider, skeleton, action, &times, model_bones, fps, &mut animation)?;
        }

        let pruned = animation.prune_empty_frames();
        if animation.is_empty() {
            ExportWarning::EmptyAnimation(action.name.clone()).record(warnings);
            continue;
        }

        tracing::info!(
            "Sampled animation '{}': {} keyframes ({} empty dropped) at {} fps",
            animation.name,
            animation.frames.len(),
            pruned,
            fps
        );
        animations.push(animation);
    }

    Ok(animations)
}

fn sample_skeleton<P: SceneProvider>(
    provider: &mut P,
    skeleton: &Skeleton,
    action: &Action,
    times: &[f32],
    model_bones: &HashSet<String>,
    fps: f32,
    animation: &mut Animation,
) -> Result<(), ExportError> {
    let bones: Vec<usize> = skeleton
        .bones
        .iter()
        .enumerate()
        .filter(|(_, bone)| model_bones.contains(&bone.name))
        .map(|(index, _)| index)
        .collect();

    for &source in times {
        let time = target_frame(source, fps);
        animation.add_frame(time);
        if bones.is_empty() {
            continue;
        }

        let posed = provider
            .pose_at(&skeleton.name, &action.name, source.trunc() as i32)
            .map_err(ExportError::Provider)?;
        if posed.len() != skeleton.bones.len() {
            return Err(ExportError::Provider(anyhow::anyhow!(
                "Skeleton '{}' posed {} bones, expected {}",
                skeleton.name,
                posed.len(),
                skeleton.bones.len()
            )));
        }

        for &index in &bones {
            let bone = &skeleton.bones[index];
            let (translation, rotation, scale) =
                bone_deformation(bone.head, bone.rest_matrix, posed[index]);
            animation.insert_keyframe(
                time,
                Keyframe {
                    bone: bone.name.clone(),
                    translation,
                    rotation,
                    scale,
                },
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Bone, Curve, MeshSnapshot, ObjectCounts, ObjectFilter};
    use anyhow::Result;

    const EPSILON: f32 = 1e-5;

    /// Provider that translates every bone by the frame number along X
    #[derive(Default)]
    struct Slider {
        bones: Vec<Mat4>,
        mode: Option<PoseMode>,
        posed_frames: Vec<i32>,
    }

    impl SceneProvider for Slider {
        type PoseState = ();

        fn object_counts(&self) -> ObjectCounts {
            ObjectCounts::default()
        }

        fn skeletons(&self, _filter: &ObjectFilter) -> Result<Vec<Skeleton>> {
            Ok(Vec::new())
        }

        fn meshes(&self, _filter: &ObjectFilter, _triangulate: bool) -> Result<Vec<MeshSnapshot>> {
            Ok(Vec::new())
        }

        fn actions(&self) -> Result<Vec<Action>> {
            Ok(Vec::new())
        }

        fn save_pose_state(&self) {}

        fn restore_pose_state(&mut self, _state: ()) {}

        fn set_pose_mode(&mut self, mode: PoseMode) {
            self.mode = Some(mode);
        }

        fn pose_at(&mut self, _skeleton: &str, _action: &str, frame: i32) -> Result<Vec<Mat4>> {
            self.posed_frames.push(frame);
            Ok(self
                .bones
                .iter()
                .map(|rest| Mat4::from_translation(Vec3::X * frame as f32) * *rest)
                .collect())
        }
    }

    fn arm_skeleton() -> Skeleton {
        let head = Vec3::new(0.0, 1.0, 0.0);
        Skeleton {
            name: "Armature".to_string(),
            bones: vec![
                Bone {
                    name: "Root".to_string(),
                    head: Vec3::ZERO,
                    rest_matrix: Mat4::IDENTITY,
                    deform: false,
                    properties: Vec::new(),
                },
                Bone {
                    name: "Arm".to_string(),
                    head,
                    rest_matrix: Mat4::from_translation(head),
                    deform: true,
                    properties: Vec::new(),
                },
            ],
        }
    }

    fn action(name: &str, times: &[&[f32]]) -> Action {
        Action {
            name: name.to_string(),
            fake_user: false,
            curves: times
                .iter()
                .map(|t| Curve {
                    bone: "Arm".to_string(),
                    keyframe_times: t.to_vec(),
                })
                .collect(),
        }
    }

    fn slider(skeleton: &Skeleton) -> Slider {
        Slider {
            bones: skeleton.bones.iter().map(|b| b.rest_matrix).collect(),
            ..Default::default()
        }
    }

    fn model_bones(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_keyframe_times_union_is_sorted_and_distinct() {
        let walk = action("Walk", &[&[10.0, 0.0, 5.0], &[5.0, 20.0]]);
        assert_eq!(keyframe_times(&walk), vec![0.0, 5.0, 10.0, 20.0]);
    }

    #[test]
    fn test_target_frame_rescales_by_fps() {
        assert_eq!(target_frame(10.0, 30.0), FrameTime(10.0));
        assert_eq!(target_frame(10.0, 60.0), FrameTime(5.0));
        assert_eq!(target_frame(3.0, 20.0).frame_number(), 4);
    }

    #[test]
    fn test_rest_pose_is_identity_deformation() {
        let head = Vec3::new(1.0, 2.0, 3.0);
        let rest = Mat4::from_rotation_translation(Quat::from_rotation_z(0.7), head);
        let (t, r, s) = bone_deformation(head, rest, rest);

        assert!(t.length() < EPSILON);
        assert!(r.abs_diff_eq(Quat::IDENTITY, EPSILON));
        assert!(s.abs_diff_eq(Vec3::ONE, EPSILON));
    }

    #[test]
    fn test_rotation_about_head_has_no_translation() {
        let head = Vec3::new(0.0, 1.0, 0.0);
        let rest = Mat4::from_translation(head);
        let spin = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let posed = Mat4::from_translation(head) * Mat4::from_quat(spin);

        let (t, r, s) = bone_deformation(head, rest, posed);
        assert!(t.length() < EPSILON);
        assert!(r.abs_diff_eq(spin, EPSILON));
        assert!(s.abs_diff_eq(Vec3::ONE, EPSILON));
    }

    #[test]
    fn test_rotation_is_canonicalised_to_positive_w() {
        // A rotation of 1.5 turns decomposes to a negative-w quaternion unless flipped
        let spin = Quat::from_rotation_x(3.0 * std::f32::consts::PI / 2.0);
        let (_, r, _) = bone_deformation(Vec3::ZERO, Mat4::IDENTITY, Mat4::from_quat(spin));
        assert!(r.w >= 0.0);
        let point = Vec3::new(0.0, 1.0, 0.0);
        assert!((r * point).abs_diff_eq(spin * point, EPSILON));
    }

    #[test]
    fn test_samples_model_bones_at_remapped_times() {
        let skeleton = arm_skeleton();
        let mut provider = slider(&skeleton);
        let mut warnings = Vec::new();

        let animations = sample_animations(
            &mut provider,
            &[skeleton],
            &[action("Wave", &[&[0.0, 10.0], &[10.0]])],
            &model_bones(&["Arm"]),
            60.0,
            &mut warnings,
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(provider.mode, Some(PoseMode::Pose));
        assert_eq!(provider.posed_frames, vec![0, 10]);

        let wave = &animations[0];
        let times: Vec<_> = wave.frames.keys().copied().collect();
        assert_eq!(times, vec![FrameTime(0.0), FrameTime(5.0)]);

        let last = &wave.frames[&FrameTime(5.0)];
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].bone, "Arm");
        assert!(last[0].translation.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPSILON));
    }

    #[test]
    fn test_fractional_source_frame_poses_truncated_frame() {
        let skeleton = arm_skeleton();
        let mut provider = slider(&skeleton);
        let mut warnings = Vec::new();

        sample_animations(
            &mut provider,
            &[skeleton],
            &[action("Wave", &[&[2.75]])],
            &model_bones(&["Arm"]),
            30.0,
            &mut warnings,
        )
        .unwrap();

        assert_eq!(provider.posed_frames, vec![2]);
    }

    #[test]
    fn test_fake_user_actions_are_skipped() {
        let skeleton = arm_skeleton();
        let mut provider = slider(&skeleton);
        let mut warnings = Vec::new();
        let mut spare = action("Spare", &[&[0.0]]);
        spare.fake_user = true;

        let animations = sample_animations(
            &mut provider,
            &[skeleton],
            &[spare],
            &model_bones(&["Arm"]),
            30.0,
            &mut warnings,
        )
        .unwrap();

        assert!(animations.is_empty());
        assert!(warnings.is_empty());
        assert!(provider.posed_frames.is_empty());
    }

    #[test]
    fn test_animation_without_model_bones_is_dropped_with_warning() {
        let skeleton = arm_skeleton();
        let mut provider = slider(&skeleton);
        let mut warnings = Vec::new();

        let animations = sample_animations(
            &mut provider,
            &[skeleton],
            &[action("Idle", &[&[0.0, 4.0]])],
            &model_bones(&[]),
            30.0,
            &mut warnings,
        )
        .unwrap();

        assert!(animations.is_empty());
        assert_eq!(
            warnings,
            vec![ExportWarning::EmptyAnimation("Idle".to_string())]
        );
    }

    #[test]
    fn test_mismatched_pose_is_a_provider_error() {
        let skeleton = arm_skeleton();
        let mut provider = Slider::default();
        let mut warnings = Vec::new();

        let result = sample_animations(
            &mut provider,
            &[skeleton],
            &[action("Wave", &[&[0.0]])],
            &model_bones(&["Arm"]),
            30.0,
            &mut warnings,
        );
        assert!(matches!(result, Err(ExportError::Provider(_))));
    }
}
