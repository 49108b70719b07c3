use std::collections::VecDeque;

use crate::{
    config::DebounceConfig,
    landmarks::{
        FACE_LANDMARK_COUNT, HAND_LANDMARK_COUNT, Landmark, LandmarkFrame, face, hand, point,
        pose,
    },
    types::{ExpressionFlags, GestureLabel},
};

const WAVE_SHOULDER_CLEARANCE: f32 = 0.05;
const WAVE_SIDE_OFFSET: f32 = 0.1;
const FINGER_EXTENDED_MARGIN: f32 = 0.02;
const FINGER_FOLDED_MARGIN: f32 = 0.01;
const PALM_EXTENDED_MARGIN: f32 = 0.01;
const PEACE_MIN_SPREAD: f32 = 0.03;
const OPEN_PALM_MIN_EXTENDED: usize = 4;
const FIST_MIN_FOLDED: usize = 3;
const SMILE_MIN_ELEVATION: f32 = 0.004;
const SMILE_MIN_ASPECT: f32 = 2.2;
const BLINK_MAX_EYE_RATIO: f32 = 0.18;

/// A detector answers `None` when it lacks the landmarks it needs.
type Detector = fn(&LandmarkFrame) -> Option<bool>;

/// Raw detectors in priority order. The first match wins.
const DETECTORS: [(GestureLabel, Detector); 6] = [
    (GestureLabel::Waving, detect_waving),
    (GestureLabel::ThumbsUp, detect_thumbs_up),
    (GestureLabel::PeaceSign, detect_peace_sign),
    (GestureLabel::Pointing, detect_pointing),
    (GestureLabel::OpenPalm, detect_open_palm),
    (GestureLabel::ClosedFist, detect_closed_fist),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierState {
    pub previous_label: GestureLabel,
    pub confidence_count: u32,
    pub history: VecDeque<GestureLabel>,
}

impl Default for ClassifierState {
    fn default() -> Self {
        Self {
            previous_label: GestureLabel::None,
            confidence_count: 0,
            history: VecDeque::new(),
        }
    }
}

pub struct GestureClassifier {
    config: DebounceConfig,
    state: ClassifierState,
}

impl GestureClassifier {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            state: ClassifierState {
                history: VecDeque::with_capacity(config.history_len + 1),
                ..ClassifierState::default()
            },
            config,
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    /// Classify one frame and return the debounced label.
    pub fn classify(&mut self, frame: &LandmarkFrame) -> GestureLabel {
        let raw = raw_label(frame);
        self.debounce(raw)
    }

    /// Feed an already-computed raw label through the persistence rules.
    pub fn debounce(&mut self, raw: GestureLabel) -> GestureLabel {
        let state = &mut self.state;

        state.history.push_back(raw);
        while state.history.len() > self.config.history_len {
            state.history.pop_front();
        }

        if raw == state.previous_label {
            state.confidence_count = state.confidence_count.saturating_add(1);
        } else {
            state.confidence_count = 1;
            state.previous_label = raw;
        }

        let skip = state.history.len().saturating_sub(self.config.window);
        let recent_count = state.history.iter().skip(skip).filter(|&&l| l == raw).count();

        if state.confidence_count >= self.config.min_consecutive
            || recent_count >= self.config.min_in_window
        {
            raw
        } else {
            GestureLabel::None
        }
    }

    pub fn reset(&mut self) {
        self.state.previous_label = GestureLabel::None;
        self.state.confidence_count = 0;
        self.state.history.clear();
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

/// Per-frame label before any debouncing.
pub fn raw_label(frame: &LandmarkFrame) -> GestureLabel {
    DETECTORS
        .iter()
        .find(|(_, detect)| detect(frame).unwrap_or(false))
        .map(|(label, _)| *label)
        .unwrap_or(GestureLabel::None)
}

pub fn expression_flags(frame: &LandmarkFrame) -> ExpressionFlags {
    ExpressionFlags {
        smiling: is_smiling(frame),
        blinking: is_blinking(frame),
        waving: is_waving(frame),
    }
}

pub fn is_waving(frame: &LandmarkFrame) -> bool {
    detect_waving(frame).unwrap_or(false)
}

pub fn is_smiling(frame: &LandmarkFrame) -> bool {
    detect_smile(frame).unwrap_or(false)
}

pub fn is_blinking(frame: &LandmarkFrame) -> bool {
    detect_blink(frame).unwrap_or(false)
}

fn detect_waving(frame: &LandmarkFrame) -> Option<bool> {
    let right = hand_raised_to_side(
        frame,
        frame.right_hand(),
        pose::RIGHT_SHOULDER,
        pose::RIGHT_ELBOW,
        pose::RIGHT_WRIST,
    );
    if right == Some(true) {
        return right;
    }

    let left = hand_raised_to_side(
        frame,
        frame.left_hand(),
        pose::LEFT_SHOULDER,
        pose::LEFT_ELBOW,
        pose::LEFT_WRIST,
    );
    match (right, left) {
        (None, None) => None,
        _ => Some(left == Some(true)),
    }
}

fn hand_raised_to_side(
    frame: &LandmarkFrame,
    hand_points: Option<&[Landmark]>,
    shoulder_idx: usize,
    elbow_idx: usize,
    wrist_idx: usize,
) -> Option<bool> {
    let hand_points = hand_points?;
    // The pose wrist only gates the check; the hand's own wrist is measured.
    frame.pose_point(wrist_idx)?;
    let shoulder = frame.pose_point(shoulder_idx)?;
    let elbow = frame.pose_point(elbow_idx)?;
    let wrist = point(hand_points, hand::WRIST)?;

    let raised = wrist.y < shoulder.y - WAVE_SHOULDER_CLEARANCE && wrist.y < elbow.y;
    let to_side = (wrist.x - shoulder.x).abs() > WAVE_SIDE_OFFSET;
    Some(raised && to_side)
}

#[derive(Clone, Copy, Debug)]
enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

/// Tip and MCP of one finger. Only this finger's points gate the lookup.
fn finger(points: &[Landmark], which: Finger) -> Option<(Landmark, Landmark)> {
    let (tip, mcp) = hand::FINGERS[which as usize];
    Some((point(points, tip)?, point(points, mcp)?))
}

fn extended(finger: (Landmark, Landmark), margin: f32) -> bool {
    let (tip, mcp) = finger;
    tip.y < mcp.y - margin
}

fn folded(finger: (Landmark, Landmark)) -> bool {
    let (tip, mcp) = finger;
    tip.y > mcp.y + FINGER_FOLDED_MARGIN
}

fn detect_thumbs_up(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_hand(frame)?;
    Some(
        extended(finger(points, Finger::Thumb)?, FINGER_EXTENDED_MARGIN)
            && folded(finger(points, Finger::Index)?)
            && folded(finger(points, Finger::Middle)?)
            && folded(finger(points, Finger::Ring)?)
            && folded(finger(points, Finger::Pinky)?),
    )
}

fn detect_peace_sign(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_hand(frame)?;
    let index = finger(points, Finger::Index)?;
    let middle = finger(points, Finger::Middle)?;
    let ring = finger(points, Finger::Ring)?;
    let pinky = finger(points, Finger::Pinky)?;
    let spread = (index.0.x - middle.0.x).abs();
    Some(
        extended(index, FINGER_EXTENDED_MARGIN)
            && extended(middle, FINGER_EXTENDED_MARGIN)
            && folded(ring)
            && folded(pinky)
            && spread > PEACE_MIN_SPREAD,
    )
}

fn detect_pointing(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_hand(frame)?;
    let index = finger(points, Finger::Index)?;
    let middle = finger(points, Finger::Middle)?;
    let ring = finger(points, Finger::Ring)?;
    let pinky = finger(points, Finger::Pinky)?;
    Some(
        extended(index, FINGER_EXTENDED_MARGIN) && folded(middle) && folded(ring) && folded(pinky),
    )
}

// The palm and fist counts tolerate individual missing points; only the
// 21-point minimum is required.
fn detect_open_palm(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_hand(frame)?;
    let extended_count = hand::FINGERS
        .iter()
        .filter_map(|&(tip, mcp)| Some((point(points, tip)?, point(points, mcp)?)))
        .filter(|&finger| extended(finger, PALM_EXTENDED_MARGIN))
        .count();
    Some(extended_count >= OPEN_PALM_MIN_EXTENDED)
}

fn detect_closed_fist(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_hand(frame)?;
    let folded_count = hand::FINGERS[1..]
        .iter()
        .filter_map(|&(tip, mcp)| Some((point(points, tip)?, point(points, mcp)?)))
        .filter(|&finger| folded(finger))
        .count();
    Some(folded_count >= FIST_MIN_FOLDED)
}

fn full_hand(frame: &LandmarkFrame) -> Option<&[Landmark]> {
    frame
        .primary_hand()
        .filter(|points| points.len() >= HAND_LANDMARK_COUNT)
}

fn full_face(frame: &LandmarkFrame) -> Option<&[Landmark]> {
    frame
        .face()
        .filter(|points| points.len() >= FACE_LANDMARK_COUNT)
}

fn detect_smile(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_face(frame)?;
    let left_corner = point(points, face::MOUTH_LEFT_CORNER)?;
    let right_corner = point(points, face::MOUTH_RIGHT_CORNER)?;
    let upper_lip = point(points, face::UPPER_LIP)?;
    let lower_lip = point(points, face::LOWER_LIP)?;
    let center = point(points, face::MOUTH_CENTER)?;

    let width = (right_corner.x - left_corner.x).abs();
    let height = (lower_lip.y - upper_lip.y).abs();
    let elevation = ((center.y - left_corner.y) + (center.y - right_corner.y)) / 2.0;

    // A closed mouth (zero height) reads as infinitely wide.
    Some(elevation > SMILE_MIN_ELEVATION && width / height > SMILE_MIN_ASPECT)
}

fn detect_blink(frame: &LandmarkFrame) -> Option<bool> {
    let points = full_face(frame)?;
    let left = eye_aspect_ratio(
        points,
        face::LEFT_EYE_TOP,
        face::LEFT_EYE_BOTTOM,
        face::LEFT_EYE_OUTER,
        face::LEFT_EYE_INNER,
    )?;
    let right = eye_aspect_ratio(
        points,
        face::RIGHT_EYE_TOP,
        face::RIGHT_EYE_BOTTOM,
        face::RIGHT_EYE_INNER,
        face::RIGHT_EYE_OUTER,
    )?;
    Some((left + right) / 2.0 < BLINK_MAX_EYE_RATIO)
}

fn eye_aspect_ratio(
    points: &[Landmark],
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
) -> Option<f32> {
    let top = point(points, top)?;
    let bottom = point(points, bottom)?;
    let left = point(points, left)?;
    let right = point(points, right)?;
    Some((top.y - bottom.y).abs() / (right.x - left.x).abs())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn thumbs_up_reported_after_three_frames() {
        let frame = hand_frame(thumbs_up_hand());
        let mut classifier = GestureClassifier::default();

        assert_eq!(raw_label(&frame), GestureLabel::ThumbsUp);
        assert_eq!(classifier.classify(&frame), GestureLabel::None);
        assert_eq!(classifier.classify(&frame), GestureLabel::None);
        assert_eq!(classifier.classify(&frame), GestureLabel::ThumbsUp);
        assert_eq!(classifier.classify(&frame), GestureLabel::ThumbsUp);
    }

    #[test]
    fn peace_sign_needs_splayed_fingers() {
        assert_eq!(raw_label(&hand_frame(peace_hand(0.05))), GestureLabel::PeaceSign);

        let narrow = raw_label(&hand_frame(peace_hand(0.02)));
        assert_ne!(narrow, GestureLabel::PeaceSign);
        let touching = raw_label(&hand_frame(peace_hand(0.0)));
        assert_ne!(touching, GestureLabel::PeaceSign);
    }

    #[test]
    fn pointing_open_palm_and_fist() {
        let pointing = hand_with_offsets([DOWN, UP, DOWN, DOWN, DOWN]);
        assert_eq!(raw_label(&hand_frame(pointing)), GestureLabel::Pointing);

        let palm = hand_with_offsets([UP, UP, UP, UP, DOWN]);
        assert_eq!(raw_label(&hand_frame(palm)), GestureLabel::OpenPalm);

        assert_eq!(raw_label(&hand_frame(fist_hand())), GestureLabel::ClosedFist);

        let pointing_over_fist = hand_with_offsets([0.0, UP, DOWN, DOWN, DOWN]);
        assert_eq!(raw_label(&hand_frame(pointing_over_fist)), GestureLabel::Pointing);

        // Three folded non-thumb fingers is still a fist.
        let loose_fist = hand_with_offsets([0.0, 0.0, DOWN, DOWN, DOWN]);
        assert_eq!(raw_label(&hand_frame(loose_fist)), GestureLabel::ClosedFist);
    }

    #[test]
    fn waving_outranks_hand_shape() {
        let mut frame = waving_frame();
        frame.right_hand = frame.right_hand.map(|mut points| {
            // Make the hand also look like a thumbs up.
            let thumbs = thumbs_up_hand();
            for (tip, mcp) in hand::FINGERS {
                points[tip] = thumbs[tip];
                points[mcp] = thumbs[mcp];
            }
            points
        });
        assert!(is_waving(&frame));
        assert_eq!(raw_label(&frame), GestureLabel::Waving);
    }

    #[test]
    fn left_hand_waves_when_right_does_not() {
        let mut frame = waving_frame();
        let mut left = frame.right_hand.take().unwrap();
        left[hand::WRIST] = Landmark::new(0.25, 0.3);
        frame.left_hand = Some(left);
        // Right hand resting at the side.
        frame.right_hand = Some(fist_hand());
        assert!(is_waving(&frame));
    }

    #[test]
    fn waving_needs_hand_to_the_side() {
        let mut frame = waving_frame();
        if let Some(points) = frame.right_hand.as_mut() {
            points[hand::WRIST] = Landmark::new(0.62, 0.3);
        }
        assert!(!is_waving(&frame));
    }

    #[test]
    fn waving_needs_pose() {
        let mut frame = waving_frame();
        frame.pose = None;
        assert!(!is_waving(&frame));
        assert_ne!(raw_label(&frame), GestureLabel::Waving);
    }

    #[test]
    fn short_hand_matches_nothing() {
        let mut points = thumbs_up_hand();
        points.truncate(12);
        assert_eq!(raw_label(&hand_frame(points)), GestureLabel::None);
    }

    #[test]
    fn right_hand_is_used_even_if_incomplete() {
        let mut frame = hand_frame(vec![Landmark::new(0.5, 0.5); 3]);
        frame.left_hand = Some(thumbs_up_hand());
        assert_eq!(raw_label(&frame), GestureLabel::None);
    }

    #[test]
    fn corrupted_point_only_disables_its_detector() {
        let mut points = thumbs_up_hand();
        points[hand::THUMB_TIP] = Landmark::new(f32::NAN, f32::NAN);
        // Thumbs up cannot run, but the fist count still sees four folded fingers.
        assert_eq!(raw_label(&hand_frame(points)), GestureLabel::ClosedFist);
    }

    #[test]
    fn corrupted_thumb_leaves_other_shapes_alone() {
        let mut pointing = hand_with_offsets([DOWN, UP, DOWN, DOWN, DOWN]);
        pointing[hand::THUMB_TIP] = Landmark::new(f32::NAN, f32::NAN);
        assert_eq!(raw_label(&hand_frame(pointing)), GestureLabel::Pointing);

        let mut peace = peace_hand(0.05);
        peace[hand::THUMB_MCP].x = f32::INFINITY;
        assert_eq!(raw_label(&hand_frame(peace)), GestureLabel::PeaceSign);
    }

    #[test]
    fn empty_frame_is_none() {
        assert_eq!(raw_label(&LandmarkFrame::default()), GestureLabel::None);
        assert_eq!(expression_flags(&LandmarkFrame::default()), ExpressionFlags::default());
    }

    #[test]
    fn two_frames_then_switch_reports_nothing() {
        let mut classifier = GestureClassifier::default();
        assert_eq!(classifier.debounce(GestureLabel::PeaceSign), GestureLabel::None);
        assert_eq!(classifier.debounce(GestureLabel::PeaceSign), GestureLabel::None);
        assert_eq!(classifier.debounce(GestureLabel::Pointing), GestureLabel::None);
        assert_eq!(classifier.state().confidence_count, 1);
        assert_eq!(classifier.state().previous_label, GestureLabel::Pointing);
    }

    #[test]
    fn windowed_recall_reports_interleaved_label() {
        let mut classifier = GestureClassifier::default();
        let sequence = [
            GestureLabel::OpenPalm,
            GestureLabel::ClosedFist,
            GestureLabel::OpenPalm,
            GestureLabel::ClosedFist,
        ];
        for raw in sequence {
            assert_eq!(classifier.debounce(raw), GestureLabel::None);
        }
        // Third palm in the last five entries, with a consecutive count of 1.
        assert_eq!(classifier.debounce(GestureLabel::OpenPalm), GestureLabel::OpenPalm);
        assert_eq!(classifier.state().confidence_count, 1);
    }

    #[test]
    fn recall_window_only_sees_recent_entries() {
        let mut classifier = GestureClassifier::default();
        for raw in [
            GestureLabel::Pointing,
            GestureLabel::Pointing,
            GestureLabel::None,
            GestureLabel::None,
            GestureLabel::ClosedFist,
            GestureLabel::OpenPalm,
        ] {
            classifier.debounce(raw);
        }
        // Only one Pointing remains in the last five entries.
        assert_eq!(classifier.debounce(GestureLabel::Pointing), GestureLabel::None);
    }

    #[test]
    fn history_is_capped() {
        let mut classifier = GestureClassifier::default();
        for i in 0..1000 {
            let raw = GestureLabel::ALL[i % GestureLabel::ALL.len()];
            classifier.debounce(raw);
            assert!(classifier.state().history.len() <= 10);
        }
        assert_eq!(classifier.state().history.len(), 10);
    }

    #[test]
    fn custom_thresholds_apply() {
        let mut classifier = GestureClassifier::new(DebounceConfig {
            min_consecutive: 2,
            window: 3,
            min_in_window: 3,
            history_len: 4,
        });
        assert_eq!(classifier.debounce(GestureLabel::ThumbsUp), GestureLabel::None);
        assert_eq!(classifier.debounce(GestureLabel::ThumbsUp), GestureLabel::ThumbsUp);
        for _ in 0..10 {
            classifier.debounce(GestureLabel::None);
        }
        assert_eq!(classifier.state().history.len(), 4);
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut classifier = GestureClassifier::default();
        for _ in 0..7 {
            classifier.classify(&hand_frame(fist_hand()));
        }
        classifier.reset();
        assert_eq!(classifier.state(), GestureClassifier::default().state());
    }

    #[test]
    fn smile_and_blink_detection() {
        let frame = LandmarkFrame {
            face: Some(face_points(true, false)),
            ..Default::default()
        };
        assert!(is_smiling(&frame));
        assert!(!is_blinking(&frame));

        let frame = LandmarkFrame {
            face: Some(face_points(false, true)),
            ..Default::default()
        };
        assert!(!is_smiling(&frame));
        assert!(is_blinking(&frame));
    }

    #[test]
    fn partial_face_mesh_is_neutral() {
        let mut points = face_points(true, true);
        points.truncate(300);
        let frame = LandmarkFrame {
            face: Some(points),
            ..Default::default()
        };
        assert!(!is_smiling(&frame));
        assert!(!is_blinking(&frame));
    }

    #[test]
    fn expressions_do_not_depend_on_debounce() {
        let mut classifier = GestureClassifier::default();
        let frame = LandmarkFrame {
            face: Some(face_points(true, true)),
            right_hand: Some(thumbs_up_hand()),
            ..Default::default()
        };
        assert_eq!(classifier.classify(&frame), GestureLabel::None);
        let flags = expression_flags(&frame);
        assert!(flags.smiling);
        assert!(flags.blinking);
        assert!(!flags.waving);
    }
}
