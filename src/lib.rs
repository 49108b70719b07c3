//! Landmark-driven avatar puppeteering.
//!
//! Per-frame pose, hand and face landmarks go in; a debounced gesture label,
//! expression flags and a smoothed joint rig come out.

pub mod animator;
pub mod config;
pub mod error;
pub mod gesture;
pub mod landmarks;
pub mod pipeline;
pub mod puppeteer;
pub mod rig;
pub mod types;

pub use animator::Animator;
pub use config::PuppetConfig;
pub use error::PuppetError;
pub use gesture::{ClassifierState, GestureClassifier};
pub use landmarks::{Landmark, LandmarkFrame};
pub use puppeteer::{Puppeteer, SessionStats};
pub use rig::PoseMapper;
pub use types::{
    AnimatorState, ExpressionFlags, GestureLabel, GesturePhase, PuppetSnapshot, RigTarget,
    RootMotion, Rotation,
};
