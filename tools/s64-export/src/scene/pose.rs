//! Channel evaluation and pose composition

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};

use super::file::{ActionDef, ChannelKeys, Key, SkeletonObject};

/// Sample a key list at `frame`, clamping outside the keyed range
fn sample<T: Copy>(keys: &[Key<T>], frame: f32, mix: impl Fn(T, T, f32) -> T) -> Option<T> {
    let first = keys.first()?;
    if keys.len() == 1 || frame <= first.frame {
        return Some(first.value);
    }

    // Find keyframes
    let mut i = 0;
    while i < keys.len() - 1 && keys[i + 1].frame < frame {
        i += 1;
    }

    if i >= keys.len() - 1 {
        return Some(keys[keys.len() - 1].value);
    }

    let (k0, k1) = (&keys[i], &keys[i + 1]);
    let factor = if k1.frame > k0.frame {
        ((frame - k0.frame) / (k1.frame - k0.frame)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(mix(k0.value, k1.value, factor))
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    Vec3::from(a).lerp(Vec3::from(b), t).into()
}

fn quat_wxyz([w, x, y, z]: [f32; 4]) -> Quat {
    Quat::from_xyzw(x, y, z, w).normalize()
}

fn slerp_wxyz(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let q = quat_wxyz(a).slerp(quat_wxyz(b), t);
    [q.w, q.x, q.y, q.z]
}

/// Local pose basis `T * R * S` of every bone of `skeleton` under `action`
pub fn pose_bases(skeleton: &SkeletonObject, action: &ActionDef, frame: f32) -> Vec<Mat4> {
    skeleton
        .bones
        .iter()
        .map(|bone| {
            let mut location = Vec3::ZERO;
            let mut rotation = Quat::IDENTITY;
            let mut scale = Vec3::ONE;

            for channel in action.channels.iter().filter(|c| c.bone == bone.name) {
                match &channel.keys {
                    ChannelKeys::Location(keys) => {
                        if let Some(v) = sample(keys, frame, lerp3) {
                            location = Vec3::from(v);
                        }
                    }
                    ChannelKeys::RotationQuaternion(keys) => {
                        if let Some(q) = sample(keys, frame, slerp_wxyz) {
                            rotation = quat_wxyz(q);
                        }
                    }
                    ChannelKeys::Scale(keys) => {
                        if let Some(v) = sample(keys, frame, lerp3) {
                            scale = Vec3::from(v);
                        }
                    }
                }
            }

            Mat4::from_scale_rotation_translation(scale, rotation, location)
        })
        .collect()
}

/// Compose armature-space posed matrices down the parent chain
///
/// `posed(b) = posed(parent) * rest(parent)^-1 * rest(b) * basis(b)`.
/// Parents must precede their children.
pub fn compose(skeleton: &SkeletonObject, rest: &[Mat4], bases: &[Mat4]) -> Result<Vec<Mat4>> {
    let mut posed: Vec<Mat4> = Vec::with_capacity(skeleton.bones.len());
    for (index, bone) in skeleton.bones.iter().enumerate() {
        let matrix = match &bone.parent {
            None => rest[index] * bases[index],
            Some(parent) => {
                let p = skeleton.bones[..index]
                    .iter()
                    .position(|b| &b.name == parent)
                    .with_context(|| {
                        format!(
                            "Bone '{}' in skeleton '{}' has parent '{}' which is not defined before it",
                            bone.name, skeleton.name, parent
                        )
                    })?;
                posed[p] * rest[p].inverse() * rest[index] * bases[index]
            }
        };
        posed.push(matrix);
    }
    Ok(posed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::file::{BoneDef, ChannelDef};

    const EPSILON: f32 = 1e-5;

    fn bone(name: &str, parent: Option<&str>, head: [f32; 3]) -> BoneDef {
        BoneDef {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            head,
            matrix: None,
            deform: true,
            properties: Vec::new(),
        }
    }

    fn chain() -> SkeletonObject {
        SkeletonObject {
            name: "Armature".to_string(),
            selected: false,
            visible: true,
            active_action: None,
            bones: vec![
                bone("Root", None, [0.0, 0.0, 0.0]),
                bone("Arm", Some("Root"), [0.0, 1.0, 0.0]),
            ],
        }
    }

    fn rest(skeleton: &SkeletonObject) -> Vec<Mat4> {
        skeleton
            .bones
            .iter()
            .map(|b| Mat4::from_translation(Vec3::from(b.head)))
            .collect()
    }

    fn action(channels: Vec<ChannelDef>) -> ActionDef {
        ActionDef {
            name: "Wave".to_string(),
            fake_user: false,
            channels,
        }
    }

    #[test]
    fn test_sample_interpolates_and_clamps() {
        let keys = [
            Key { frame: 0.0, value: [0.0, 0.0, 0.0] },
            Key { frame: 10.0, value: [10.0, 0.0, 0.0] },
        ];
        assert_eq!(sample(&keys, -5.0, lerp3), Some([0.0, 0.0, 0.0]));
        assert_eq!(sample(&keys, 5.0, lerp3), Some([5.0, 0.0, 0.0]));
        assert_eq!(sample(&keys, 20.0, lerp3), Some([10.0, 0.0, 0.0]));

        let empty: [Key<[f32; 3]>; 0] = [];
        assert_eq!(sample(&empty, 0.0, lerp3), None);
    }

    #[test]
    fn test_unanimated_skeleton_stays_at_rest() {
        let skeleton = chain();
        let rest = rest(&skeleton);
        let bases = pose_bases(&skeleton, &action(Vec::new()), 3.0);
        let posed = compose(&skeleton, &rest, &bases).unwrap();

        for (p, r) in posed.iter().zip(&rest) {
            assert!(p.abs_diff_eq(*r, EPSILON));
        }
    }

    #[test]
    fn test_parent_motion_carries_children() {
        let skeleton = chain();
        let rest = rest(&skeleton);
        let lift = action(vec![ChannelDef {
            bone: "Root".to_string(),
            keys: ChannelKeys::Location(vec![Key {
                frame: 0.0,
                value: [0.0, 0.0, 2.0],
            }]),
        }]);

        let posed = compose(&skeleton, &rest, &pose_bases(&skeleton, &lift, 0.0)).unwrap();
        let arm_head = posed[1].transform_point3(Vec3::ZERO);
        assert!(arm_head.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), EPSILON));
    }

    #[test]
    fn test_rotation_keys_slerp() {
        let skeleton = chain();
        let turn = action(vec![ChannelDef {
            bone: "Arm".to_string(),
            keys: ChannelKeys::RotationQuaternion(vec![
                Key { frame: 0.0, value: [1.0, 0.0, 0.0, 0.0] },
                Key {
                    frame: 10.0,
                    value: [
                        std::f32::consts::FRAC_1_SQRT_2,
                        0.0,
                        0.0,
                        std::f32::consts::FRAC_1_SQRT_2,
                    ],
                },
            ]),
        }]);

        let bases = pose_bases(&skeleton, &turn, 5.0);
        let (_, rotation, _) = bases[1].to_scale_rotation_translation();
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(rotation.abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn test_child_before_parent_is_rejected() {
        let mut skeleton = chain();
        skeleton.bones.reverse();
        let rest = rest(&skeleton);
        let bases = vec![Mat4::IDENTITY; 2];
        assert!(compose(&skeleton, &rest, &bases).is_err());
    }
}
