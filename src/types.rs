use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GestureLabel {
    #[default]
    None,
    Waving,
    ThumbsUp,
    PeaceSign,
    Pointing,
    OpenPalm,
    ClosedFist,
}

impl GestureLabel {
    /// Every label in priority order.
    pub const ALL: [GestureLabel; 7] = [
        GestureLabel::None,
        GestureLabel::Waving,
        GestureLabel::ThumbsUp,
        GestureLabel::PeaceSign,
        GestureLabel::Pointing,
        GestureLabel::OpenPalm,
        GestureLabel::ClosedFist,
    ];

    pub fn is_active(&self) -> bool {
        *self != GestureLabel::None
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GestureLabel::None => "No gesture",
            GestureLabel::Waving => "Waving",
            GestureLabel::ThumbsUp => "Thumbs Up",
            GestureLabel::PeaceSign => "Peace Sign",
            GestureLabel::Pointing => "Pointing",
            GestureLabel::OpenPalm => "Open Palm",
            GestureLabel::ClosedFist => "Closed Fist",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureLabel::None => "⋯ ",
            GestureLabel::Waving => "👋 ",
            GestureLabel::ThumbsUp => "👍 ",
            GestureLabel::PeaceSign => "✌️ ",
            GestureLabel::Pointing => "👉 ",
            GestureLabel::OpenPalm => "🖐 ",
            GestureLabel::ClosedFist => "✊ ",
        }
    }
}

/// Per-frame expression queries. Never debounced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExpressionFlags {
    pub smiling: bool,
    pub blinking: bool,
    /// Raw, undebounced wave detection for this frame.
    pub waving: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Target pose derived from one landmark frame. Angles are radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RigTarget {
    pub head: Rotation,
    pub body_z: f32,
    pub left_arm_z: f32,
    pub right_arm_z: f32,
    pub left_leg_z: f32,
    pub right_leg_z: f32,
    pub is_smiling: bool,
    pub is_blinking: bool,
    pub is_waving: bool,
    pub gesture_scale: f32,
}

impl Default for RigTarget {
    fn default() -> Self {
        Self {
            head: Rotation::default(),
            body_z: 0.0,
            left_arm_z: 0.0,
            right_arm_z: 0.0,
            left_leg_z: 0.0,
            right_leg_z: 0.0,
            is_smiling: false,
            is_blinking: false,
            is_waving: false,
            gesture_scale: 1.0,
        }
    }
}

/// Vertical bob and yaw sway applied to the avatar root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RootMotion {
    pub bob_y: f32,
    pub sway_yaw: f32,
}

/// Smoothed rig values the renderer samples each draw.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimatorState {
    pub head: Rotation,
    pub head_scale: f32,
    pub body_z: f32,
    pub left_arm_z: f32,
    pub right_arm_z: f32,
    pub left_leg_z: f32,
    pub right_leg_z: f32,
    pub hand_scale: f32,
    pub is_smiling: bool,
    pub is_blinking: bool,
    pub is_waving: bool,
    pub wave_phase: f32,
    pub root: RootMotion,
}

impl Default for AnimatorState {
    fn default() -> Self {
        Self {
            head: Rotation::default(),
            head_scale: 1.0,
            body_z: 0.0,
            left_arm_z: 0.0,
            right_arm_z: 0.0,
            left_leg_z: 0.0,
            right_leg_z: 0.0,
            hand_scale: 1.0,
            is_smiling: false,
            is_blinking: false,
            is_waving: false,
            wave_phase: 0.0,
            root: RootMotion::default(),
        }
    }
}

/// Hold state of the debounced label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum GesturePhase {
    #[default]
    Idle,
    Held(GestureLabel),
}

impl GesturePhase {
    pub fn from_label(label: GestureLabel) -> Self {
        if label.is_active() {
            GesturePhase::Held(label)
        } else {
            GesturePhase::Idle
        }
    }
}

/// Everything a renderer or UI needs for one draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PuppetSnapshot {
    pub label: GestureLabel,
    pub flags: ExpressionFlags,
    pub phase: GesturePhase,
    pub idle: bool,
    pub state: AnimatorState,
}

impl PuppetSnapshot {
    pub fn display_text(&self) -> String {
        let mut text = format!("{}{}", self.label.emoji(), self.label.display_name());
        if self.flags.smiling {
            text.push_str(" | smiling");
        }
        if self.flags.blinking {
            text.push_str(" | blinking");
        }
        text
    }
}
