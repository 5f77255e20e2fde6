//! Scene graph provider interface
//!
//! The exporter never walks a live scene itself. A [`SceneProvider`] hands
//! over already-evaluated skeletons, mesh snapshots and actions, and poses
//! skeletons on request. Posing moves a shared cursor (current frame, pose
//! mode, active actions); [`PoseGuard`] saves that cursor up front and puts
//! it back when dropped, on every exit path.

use anyhow::Result;
use glam::{Mat4, Vec3};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::ops::{Deref, DerefMut};

/// A bone of a skeleton in its rest configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Rest head position in armature space
    pub head: Vec3,
    /// Rest matrix in armature space
    pub rest_matrix: Mat4,
    /// Only deforming bones own geometry
    pub deform: bool,
    /// Custom property names, in definition order
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub name: String,
    pub bones: Vec<Bone>,
}

/// One polygon corner with its vertex data and skinning weights
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Source UV (V not yet flipped)
    pub uv: Option<[f32; 2]>,
    pub color: Option<[f32; 4]>,
    /// `(vertex group id, weight)` pairs of the corner's vertex
    pub weights: SmallVec<[(u32, f32); 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub corners: Vec<Corner>,
    /// Index into [`MeshSnapshot::material_slots`]
    pub material_index: usize,
}

/// An evaluated mesh (modifiers applied, rest pose)
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSnapshot {
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// Vertex group id -> group name
    pub group_names: HashMap<u32, String>,
    /// Material name per slot; empty string for an empty slot
    pub material_slots: Vec<String>,
}

/// An animation curve attached to a bone property
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub bone: String,
    /// Keyframe times in source frames
    pub keyframe_times: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    /// Kept alive by a fake user rather than assigned to a character
    pub fake_user: bool,
    pub curves: Vec<Curve>,
}

/// Which objects the provider reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectFilter {
    pub selected_only: bool,
    pub visible_only: bool,
}

/// Unfiltered object totals in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectCounts {
    pub skeletons: usize,
    pub meshes: usize,
}

/// Whether skeletons show their rest or their animated pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseMode {
    Rest,
    #[default]
    Pose,
}

/// Source of scene data for an export
pub trait SceneProvider {
    /// Snapshot of the mutable pose cursor
    type PoseState;

    fn object_counts(&self) -> ObjectCounts;

    fn skeletons(&self, filter: &ObjectFilter) -> Result<Vec<Skeleton>>;

    /// Evaluated meshes; `triangulate` splits quads into triangles
    fn meshes(&self, filter: &ObjectFilter, triangulate: bool) -> Result<Vec<MeshSnapshot>>;

    fn actions(&self) -> Result<Vec<Action>>;

    fn save_pose_state(&self) -> Self::PoseState;

    fn restore_pose_state(&mut self, state: Self::PoseState);

    fn set_pose_mode(&mut self, mode: PoseMode);

    /// Pose `skeleton` with `action` at `frame`
    ///
    /// Returns one armature-space matrix per bone, in skeleton bone order.
    fn pose_at(&mut self, skeleton: &str, action: &str, frame: i32) -> Result<Vec<Mat4>>;
}

/// Restores the provider's pose cursor when dropped
pub struct PoseGuard<'a, P: SceneProvider> {
    provider: &'a mut P,
    saved: Option<P::PoseState>,
}

impl<'a, P: SceneProvider> PoseGuard<'a, P> {
    pub fn new(provider: &'a mut P) -> Self {
        let saved = Some(provider.save_pose_state());
        Self { provider, saved }
    }
}

impl<P: SceneProvider> Deref for PoseGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.provider
    }
}

impl<P: SceneProvider> DerefMut for PoseGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider
    }
}

impl<P: SceneProvider> Drop for PoseGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(state) = self.saved.take() {
            self.provider.restore_pose_state(state);
            tracing::debug!("Restored scene pose state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider with nothing but a pose cursor
    #[derive(Default)]
    struct Cursor {
        frame: i32,
        mode: PoseMode,
        restores: usize,
    }

    impl SceneProvider for Cursor {
        type PoseState = (i32, PoseMode);

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

        fn save_pose_state(&self) -> Self::PoseState {
            (self.frame, self.mode)
        }

        fn restore_pose_state(&mut self, (frame, mode): Self::PoseState) {
            self.frame = frame;
            self.mode = mode;
            self.restores += 1;
        }

        fn set_pose_mode(&mut self, mode: PoseMode) {
            self.mode = mode;
        }

        fn pose_at(&mut self, _skeleton: &str, _action: &str, frame: i32) -> Result<Vec<Mat4>> {
            if frame < 0 {
                anyhow::bail!("negative frame {}", frame);
            }
            self.frame = frame;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut cursor = Cursor {
            frame: 7,
            ..Default::default()
        };

        {
            let mut guard = PoseGuard::new(&mut cursor);
            guard.set_pose_mode(PoseMode::Rest);
            guard.pose_at("Armature", "Walk", 42).unwrap();
            assert_eq!(guard.frame, 42);
        }

        assert_eq!(cursor.frame, 7);
        assert_eq!(cursor.mode, PoseMode::Pose);
        assert_eq!(cursor.restores, 1);
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn sample(provider: &mut Cursor) -> Result<()> {
            let mut guard = PoseGuard::new(provider);
            guard.pose_at("Armature", "Walk", 3)?;
            guard.pose_at("Armature", "Walk", -1)?;
            Ok(())
        }

        let mut cursor = Cursor::default();
        assert!(sample(&mut cursor).is_err());
        assert_eq!(cursor.frame, 0);
        assert_eq!(cursor.restores, 1);
    }
}
