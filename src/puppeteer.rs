use std::collections::BTreeMap;

use crate::{
    animator::Animator,
    config::PuppetConfig,
    gesture::{self, GestureClassifier},
    landmarks::LandmarkFrame,
    rig::PoseMapper,
    types::{
        AnimatorState, ExpressionFlags, GestureLabel, GesturePhase, PuppetSnapshot, RigTarget,
    },
};

/// Counters for the end-of-run summary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStats {
    pub frames: u64,
    pub idle_ticks: u64,
    pub advance_ticks: u64,
    pub label_frames: BTreeMap<GestureLabel, u64>,
}

/// One puppeting session: classifier, rig target and damper driven together.
pub struct Puppeteer {
    classifier: GestureClassifier,
    mapper: PoseMapper,
    animator: Animator,
    target: RigTarget,
    label: GestureLabel,
    flags: ExpressionFlags,
    phase: GesturePhase,
    has_frame: bool,
    idle: bool,
    stats: SessionStats,
}

impl Puppeteer {
    pub fn new(config: &PuppetConfig) -> Self {
        Self {
            classifier: GestureClassifier::new(config.debounce.clone()),
            mapper: PoseMapper::new(config.mapper.clone()),
            animator: Animator::new(config.damping.clone(), config.idle.clone()),
            target: RigTarget::default(),
            label: GestureLabel::None,
            flags: ExpressionFlags::default(),
            phase: GesturePhase::Idle,
            has_frame: false,
            idle: true,
            stats: SessionStats::default(),
        }
    }

    /// Process one tracker frame. `elapsed` drives the idle sway when the
    /// frame turns out to be empty.
    pub fn on_frame(&mut self, frame: &LandmarkFrame, elapsed: f32, dt: f32) -> PuppetSnapshot {
        self.stats.frames += 1;

        self.label = self.classifier.classify(frame);
        self.flags = gesture::expression_flags(frame);
        *self.stats.label_frames.entry(self.label).or_default() += 1;
        self.update_phase();

        if frame.is_empty() {
            self.stats.idle_ticks += 1;
            self.idle = true;
            self.animator.idle_tick(elapsed, dt);
            return self.snapshot();
        }

        if let Some(pose) = frame.pose() {
            self.mapper.apply(pose, &mut self.target);
        }
        self.has_frame = true;
        self.idle = false;
        self.animator.tick(&self.target, self.label, self.flags, dt);
        self.snapshot()
    }

    /// Tick without a new frame. Keeps damping toward the last target, or
    /// idles if no frame has arrived since construction or reset.
    pub fn advance(&mut self, elapsed: f32, dt: f32) -> PuppetSnapshot {
        if !self.has_frame || self.idle {
            return self.on_idle(elapsed, dt);
        }
        self.stats.advance_ticks += 1;
        self.animator.tick(&self.target, self.label, self.flags, dt);
        self.snapshot()
    }

    /// Idle tick: root sway from the session clock, rig relaxes to rest.
    pub fn on_idle(&mut self, elapsed: f32, dt: f32) -> PuppetSnapshot {
        self.stats.idle_ticks += 1;
        self.idle = true;
        self.animator.idle_tick(elapsed, dt);
        self.snapshot()
    }

    pub fn reset(&mut self) {
        self.classifier.reset();
        self.animator.reset();
        self.target = RigTarget::default();
        self.label = GestureLabel::None;
        self.flags = ExpressionFlags::default();
        if self.phase != GesturePhase::Idle {
            log::info!("gesture phase reset to idle");
        }
        self.phase = GesturePhase::Idle;
        self.has_frame = false;
        self.idle = true;
    }

    pub fn snapshot(&self) -> PuppetSnapshot {
        PuppetSnapshot {
            label: self.label,
            flags: self.flags,
            phase: self.phase,
            idle: self.idle,
            state: *self.animator.state(),
        }
    }

    pub fn label(&self) -> GestureLabel {
        self.label
    }

    pub fn flags(&self) -> ExpressionFlags {
        self.flags
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn state(&self) -> &AnimatorState {
        self.animator.state()
    }

    pub fn target(&self) -> &RigTarget {
        &self.target
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    fn update_phase(&mut self) {
        let next = GesturePhase::from_label(self.label);
        if next == self.phase {
            return;
        }
        match (self.phase, next) {
            (_, GesturePhase::Held(label)) => {
                log::info!("gesture held: {}{}", label.emoji(), label.display_name())
            }
            (GesturePhase::Held(label), GesturePhase::Idle) => {
                log::info!("gesture released: {}", label.display_name())
            }
            (GesturePhase::Idle, GesturePhase::Idle) => {}
        }
        self.phase = next;
    }
}

impl Default for Puppeteer {
    fn default() -> Self {
        Self::new(&PuppetConfig::default())
    }
}
