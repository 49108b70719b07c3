use std::f32::consts::FRAC_PI_2;

use crate::{
    config::MapperConfig,
    landmarks::{Landmark, point, pose},
    types::RigTarget,
};

const BODY_TILT_WEIGHT: f32 = -0.5;
const HEAD_YAW_GAIN: f32 = 2.0;
const HEAD_ROLL_WEIGHT: f32 = -0.3;

/// Turns pose landmarks into joint rotation targets.
#[derive(Clone, Debug, Default)]
pub struct PoseMapper {
    config: MapperConfig,
}

impl PoseMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Update `target` in place from a pose. Channels whose joints are missing
    /// keep their previous value. Returns false when shoulders or hips are
    /// missing, in which case nothing is touched.
    pub fn apply(&self, pose_points: &[Landmark], target: &mut RigTarget) -> bool {
        let joint = |index| self.joint(pose_points, index);

        let (Some(left_shoulder), Some(right_shoulder), Some(_), Some(_)) = (
            joint(pose::LEFT_SHOULDER),
            joint(pose::RIGHT_SHOULDER),
            joint(pose::LEFT_HIP),
            joint(pose::RIGHT_HIP),
        ) else {
            return false;
        };

        let shoulder_angle = segment_angle(left_shoulder, right_shoulder);
        target.body_z = BODY_TILT_WEIGHT * shoulder_angle;

        if let Some(nose) = joint(pose::NOSE) {
            let shoulder_mid_x = (left_shoulder.x + right_shoulder.x) / 2.0;
            target.head.y = HEAD_YAW_GAIN * (nose.x - shoulder_mid_x);
            target.head.z = HEAD_ROLL_WEIGHT * shoulder_angle;
        }

        // Arms hang at zero: a wrist straight below its elbow reads as "down".
        if let Some(angle) = limb_angle(joint(pose::LEFT_ELBOW), joint(pose::LEFT_WRIST)) {
            target.left_arm_z = angle - FRAC_PI_2;
        }
        if let Some(angle) = limb_angle(joint(pose::RIGHT_ELBOW), joint(pose::RIGHT_WRIST)) {
            target.right_arm_z = angle - FRAC_PI_2;
        }
        if let Some(angle) = limb_angle(joint(pose::LEFT_KNEE), joint(pose::LEFT_ANKLE)) {
            target.left_leg_z = angle;
        }
        if let Some(angle) = limb_angle(joint(pose::RIGHT_KNEE), joint(pose::RIGHT_ANKLE)) {
            target.right_leg_z = angle;
        }

        true
    }

    fn joint(&self, pose_points: &[Landmark], index: usize) -> Option<Landmark> {
        point(pose_points, index).filter(|lm| {
            lm.visibility
                .is_none_or(|visibility| visibility >= self.config.min_visibility)
        })
    }
}

fn segment_angle(from: Landmark, to: Landmark) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

fn limb_angle(from: Option<Landmark>, to: Option<Landmark>) -> Option<f32> {
    Some(segment_angle(from?, to?))
}
