pub mod driver;
pub mod source;

pub use driver::{ClockMode, FrameClock, run_driver_loop};
pub use source::{
    LandmarkSource, LandmarkStream, Pacing, RecordingSource, TimedFrame, parse_recording_line,
    start_landmark_stream,
};
