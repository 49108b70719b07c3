use serde::{Deserialize, Serialize};

pub const POSE_LANDMARK_COUNT: usize = 33;
pub const HAND_LANDMARK_COUNT: usize = 21;
pub const FACE_LANDMARK_COUNT: usize = 468;

/// Body landmark indices (33-point pose topology).
pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}

/// Hand landmark indices (21-point hand topology).
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;

    /// (tip, mcp) for thumb, index, middle, ring, pinky.
    pub const FINGERS: [(usize, usize); 5] = [
        (THUMB_TIP, THUMB_MCP),
        (INDEX_TIP, INDEX_MCP),
        (MIDDLE_TIP, MIDDLE_MCP),
        (RING_TIP, RING_MCP),
        (PINKY_TIP, PINKY_MCP),
    ];
}

/// The few face mesh indices the expression detectors read.
pub mod face {
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;
    pub const MOUTH_CENTER: usize = 17;
    pub const MOUTH_LEFT_CORNER: usize = 61;
    pub const MOUTH_RIGHT_CORNER: usize = 291;

    pub const LEFT_EYE_TOP: usize = 159;
    pub const LEFT_EYE_BOTTOM: usize = 145;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;

    pub const RIGHT_EYE_TOP: usize = 386;
    pub const RIGHT_EYE_BOTTOM: usize = 374;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
}

/// A normalized keypoint; x and y are in [0, 1] relative to the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Looks up `index`, treating out-of-range and non-finite points as absent.
pub fn point(points: &[Landmark], index: usize) -> Option<Landmark> {
    points.get(index).copied().filter(Landmark::is_finite)
}

/// One tick of tracker output. Every sequence is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkFrame {
    #[serde(default, alias = "poseLandmarks")]
    pub pose: Option<Vec<Landmark>>,
    #[serde(default, alias = "leftHandLandmarks")]
    pub left_hand: Option<Vec<Landmark>>,
    #[serde(default, alias = "rightHandLandmarks")]
    pub right_hand: Option<Vec<Landmark>>,
    #[serde(default, alias = "faceLandmarks")]
    pub face: Option<Vec<Landmark>>,
}

impl LandmarkFrame {
    pub fn pose(&self) -> Option<&[Landmark]> {
        self.pose.as_deref()
    }

    pub fn left_hand(&self) -> Option<&[Landmark]> {
        self.left_hand.as_deref()
    }

    pub fn right_hand(&self) -> Option<&[Landmark]> {
        self.right_hand.as_deref()
    }

    pub fn face(&self) -> Option<&[Landmark]> {
        self.face.as_deref()
    }

    /// Right hand when present, otherwise the left one.
    pub fn primary_hand(&self) -> Option<&[Landmark]> {
        self.right_hand().or_else(|| self.left_hand())
    }

    pub fn pose_point(&self, index: usize) -> Option<Landmark> {
        self.pose().and_then(|pose| point(pose, index))
    }

    /// True when the tracker reported nothing at all for this tick.
    pub fn is_empty(&self) -> bool {
        self.pose.is_none()
            && self.left_hand.is_none()
            && self.right_hand.is_none()
            && self.face.is_none()
    }
}
