use nalgebra::{Unit, UnitQuaternion, Vector3};
use rcarton_layout::PanelTree;
use rcarton_model::{calculate_local_progress, BoneIndex, FoldSchedule, PanelId};

use crate::pose::Pose;
use crate::skeleton::bone_for_node;

/// Everything needed to pose one joint, resolved once per topology change.
#[derive(Debug, Clone, PartialEq)]
pub struct JointChannel {
    pub bone: BoneIndex,
    pub panel_id: PanelId,
    pub start: f32,
    pub end: f32,
    pub axis: Unit<Vector3<f32>>,
    pub direction: f32,
    pub max_angle: f32,
}

impl JointChannel {
    pub fn angle(&self, progress: f32) -> f32 {
        calculate_local_progress(progress, self.start, self.end) * self.max_angle * self.direction
    }

    pub fn rotation(&self, progress: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&self.axis, self.angle(progress))
    }
}

/// Maps the global fold progress onto bone rotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldAnimator {
    channels: Vec<JointChannel>,
}

/// NaN reads as flat, everything else is clamped to `[0, 1]`.
pub fn sanitize_progress(progress: f32) -> f32 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

impl FoldAnimator {
    pub fn new(tree: &PanelTree, schedule: &FoldSchedule) -> Self {
        let channels = tree
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let joint = node.joint.as_ref()?;
                Some(JointChannel {
                    bone: bone_for_node(index as u32),
                    panel_id: node.id.clone(),
                    start: 0.0,
                    end: 1.0,
                    axis: joint.axis,
                    direction: joint.direction,
                    max_angle: joint.max_fold_angle,
                })
            })
            .collect();
        let mut animator = Self { channels };
        animator.retime(schedule);
        animator
    }

    /// Picks up new timing windows without touching the joints.
    pub fn retime(&mut self, schedule: &FoldSchedule) {
        for channel in &mut self.channels {
            match schedule.window(&channel.panel_id) {
                Some(window) => {
                    channel.start = window.start;
                    channel.end = window.end;
                }
                None => {
                    tracing::debug!("no timing window for '{}', folding over the whole range", channel.panel_id);
                    channel.start = 0.0;
                    channel.end = 1.0;
                }
            }
        }
    }

    pub fn channels(&self) -> &[JointChannel] {
        &self.channels
    }

    /// Writes one rotation per joint into `pose`; other bones are left untouched.
    pub fn apply(&self, progress: f32, pose: &mut Pose) {
        let progress = sanitize_progress(progress);
        for channel in &self.channels {
            pose.set(channel.bone, channel.rotation(progress));
        }
    }

    pub fn pose(&self, progress: f32, bone_count: usize) -> Pose {
        let mut pose = Pose::rest(bone_count);
        self.apply(progress, &mut pose);
        pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcarton_layout::{build_panel_tree, FoldSequencer, TreeOptions};
    use rcarton_model::{DrivenMap, Panel};
    use rstest::rstest;
    use std::f32::consts::FRAC_PI_2;

    fn animator() -> FoldAnimator {
        let panels = vec![
            Panel::new("A", 0.0, 0.0, 100.0, 50.0),
            Panel::new("B", 100.0, 0.0, 100.0, 50.0),
            Panel::new("C", 0.0, 50.0, 100.0, 50.0),
        ];
        let map = DrivenMap::from_edges([("A", "B"), ("A", "C")]).unwrap();
        let tree = build_panel_tree(&panels, &map, "A", &TreeOptions::default()).unwrap();
        let schedule = FoldSequencer::default().schedule("A", &["B".to_string(), "C".to_string()]);
        FoldAnimator::new(&tree, &schedule)
    }

    #[test]
    fn one_channel_per_joint() {
        let animator = animator();
        let bones = animator.channels().iter().map(|c| c.bone).collect::<Vec<_>>();
        assert_eq!(bones, [2, 3]);
        assert_eq!(animator.channels()[0].start, 0.0);
        assert_eq!(animator.channels()[1].end, 1.0);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0)]
    #[case(-3.0, 0.0, 0.0)]
    #[case(f32::NAN, 0.0, 0.0)]
    #[case(1.0, -FRAC_PI_2, FRAC_PI_2)]
    #[case(9.0, -FRAC_PI_2, FRAC_PI_2)]
    fn angles(#[case] progress: f32, #[case] b: f32, #[case] c: f32) {
        let animator = animator();
        let progress = sanitize_progress(progress);
        let angles = animator
            .channels()
            .iter()
            .map(|ch| ch.angle(progress))
            .collect::<Vec<_>>();
        assert!((angles[0] - b).abs() < 1e-6, "{angles:?}");
        assert!((angles[1] - c).abs() < 1e-6, "{angles:?}");
    }

    #[test]
    fn staggered_midway() {
        let animator = animator();
        // B is done by 1/1.7, C starts at 0.7/1.7
        let pose = animator.pose(0.5, 4);
        let b = pose.rotation(2).unwrap().angle();
        let c = pose.rotation(3).unwrap().angle();
        assert!(b > c && c > 0.0, "b {b}, c {c}");
        assert_eq!(pose.rotation(1), Some(&UnitQuaternion::identity()));
    }

    #[test]
    fn rest_pose_is_identity() {
        let pose = animator().pose(0.0, 4);
        assert_eq!(pose, Pose::rest(4));
    }
}
