//! Framerate-independent damping of rig channels toward their targets.
//!
//! Each channel closes `1 - residual^dt` of its remaining gap per tick, so a
//! one second run leaves `residual` of the gap no matter how it is sliced.
//! Waving swaps the arm channels for a procedural antiphase swing, and an
//! idle path bobs the root when no tracking data exists.

use std::f32::consts::PI;

use crate::{
    config::{DampingConfig, IdleConfig},
    types::{AnimatorState, ExpressionFlags, GestureLabel, RigTarget, RootMotion},
};

pub struct Animator {
    damping: DampingConfig,
    idle: IdleConfig,
    state: AnimatorState,
}

impl Animator {
    pub fn new(damping: DampingConfig, idle: IdleConfig) -> Self {
        Self {
            damping,
            idle,
            state: AnimatorState::default(),
        }
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    /// Interpolation factor for a tick of `dt` seconds.
    pub fn blend_factor(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        1.0 - self.damping.residual_per_second.powf(dt)
    }

    /// Advance one pose-driven tick.
    pub fn tick(
        &mut self,
        target: &RigTarget,
        label: GestureLabel,
        flags: ExpressionFlags,
        dt: f32,
    ) -> &AnimatorState {
        let target = with_signals(target, label, flags, self.damping.gesture_hand_scale);
        let f = self.blend_factor(dt);
        let state = &mut self.state;

        state.head.x = lerp(state.head.x, target.head.x, f);
        state.head.y = lerp(state.head.y, target.head.y, f);
        state.head.z = lerp(state.head.z, target.head.z, f);
        let head_scale = if target.is_smiling {
            self.damping.smile_head_scale
        } else {
            1.0
        };
        state.head_scale = lerp(state.head_scale, head_scale, f);
        state.body_z = lerp(state.body_z, target.body_z, f);

        if target.is_waving {
            if dt.is_finite() && dt > 0.0 {
                state.wave_phase += dt * self.damping.wave_speed;
            }
            let amplitude = self.damping.wave_amplitude;
            let offset = self.damping.wave_offset;
            state.left_arm_z = state.wave_phase.sin() * amplitude - offset;
            state.right_arm_z = (state.wave_phase + PI).sin() * amplitude + offset;
        } else {
            state.left_arm_z = lerp(state.left_arm_z, target.left_arm_z, f);
            state.right_arm_z = lerp(state.right_arm_z, target.right_arm_z, f);
        }

        state.left_leg_z = lerp(state.left_leg_z, target.left_leg_z, f);
        state.right_leg_z = lerp(state.right_leg_z, target.right_leg_z, f);
        state.hand_scale = lerp(state.hand_scale, target.gesture_scale, f);

        state.root.bob_y = lerp(state.root.bob_y, 0.0, f);
        state.root.sway_yaw = lerp(state.root.sway_yaw, 0.0, f);

        state.is_smiling = target.is_smiling;
        state.is_blinking = target.is_blinking;
        state.is_waving = target.is_waving;

        &self.state
    }

    /// Advance one tick without tracking data. `elapsed` is the session clock
    /// in seconds; the root sway is a pure function of it.
    pub fn idle_tick(&mut self, elapsed: f32, dt: f32) -> &AnimatorState {
        self.tick(
            &RigTarget::default(),
            GestureLabel::None,
            ExpressionFlags::default(),
            dt,
        );
        self.state.root = self.idle_motion(elapsed);
        &self.state
    }

    pub fn idle_motion(&self, elapsed: f32) -> RootMotion {
        let idle = &self.idle;
        RootMotion {
            bob_y: (elapsed * idle.bob_frequency).sin() * idle.bob_amplitude,
            sway_yaw: (elapsed * idle.sway_frequency).sin() * idle.sway_amplitude,
        }
    }

    pub fn reset(&mut self) {
        self.state = AnimatorState::default();
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DampingConfig::default(), IdleConfig::default())
    }
}

/// Stamp the classifier outputs onto a pose target.
pub fn with_signals(
    target: &RigTarget,
    label: GestureLabel,
    flags: ExpressionFlags,
    gesture_scale: f32,
) -> RigTarget {
    RigTarget {
        is_smiling: flags.smiling,
        is_blinking: flags.blinking,
        is_waving: label == GestureLabel::Waving,
        gesture_scale: if label.is_active() { gesture_scale } else { 1.0 },
        ..*target
    }
}

fn lerp(from: f32, to: f32, f: f32) -> f32 {
    from + (to - from) * f
}
