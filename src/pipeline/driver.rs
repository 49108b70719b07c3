use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::source::TimedFrame;
use crate::{puppeteer::Puppeteer, types::PuppetSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// dt is the wall-clock time between ticks.
    Wall,
    /// dt comes from the frames' own timestamps.
    Recorded,
}

/// Produces `(elapsed, dt)` pairs for each tick, in seconds.
#[derive(Debug)]
pub struct FrameClock {
    mode: ClockMode,
    nominal_dt: f32,
    max_dt: f32,
    started: Instant,
    last_tick: Instant,
    elapsed: f32,
    last_stamp: Option<f64>,
}

impl FrameClock {
    pub fn new(mode: ClockMode, nominal_interval: Duration, max_dt: f32) -> Self {
        let now = Instant::now();
        Self {
            mode,
            nominal_dt: nominal_interval.as_secs_f32(),
            max_dt,
            started: now,
            last_tick: now,
            elapsed: 0.0,
            last_stamp: None,
        }
    }

    pub fn on_frame(&mut self, stamp: Option<f64>) -> (f32, f32) {
        match self.mode {
            ClockMode::Wall => self.wall_tick(),
            ClockMode::Recorded => {
                let dt = match (self.last_stamp, stamp) {
                    (Some(prev), Some(cur)) if cur > prev => (cur - prev) as f32,
                    _ => self.nominal_dt,
                };
                if stamp.is_some() {
                    self.last_stamp = stamp;
                }
                self.advance(dt)
            }
        }
    }

    /// Tick for a gap with no frame.
    pub fn on_gap(&mut self) -> (f32, f32) {
        match self.mode {
            ClockMode::Wall => self.wall_tick(),
            ClockMode::Recorded => self.advance(self.nominal_dt),
        }
    }

    fn wall_tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f32().min(self.max_dt);
        self.last_tick = now;
        self.elapsed = now.duration_since(self.started).as_secs_f32();
        (self.elapsed, dt)
    }

    fn advance(&mut self, dt: f32) -> (f32, f32) {
        let dt = dt.min(self.max_dt);
        self.elapsed += dt;
        (self.elapsed, dt)
    }
}

/// Feed frames into the puppeteer until the source disconnects. With a
/// `gap_timeout`, silence longer than it produces an in-between tick so the
/// rig keeps settling (or idling) while the tracker is quiet.
pub fn run_driver_loop<F>(
    frame_rx: &Receiver<TimedFrame>,
    puppeteer: &mut Puppeteer,
    clock: &mut FrameClock,
    gap_timeout: Option<Duration>,
    mut on_snapshot: F,
) -> Result<()>
where
    F: FnMut(&PuppetSnapshot) -> Result<()>,
{
    loop {
        let received = match gap_timeout {
            Some(timeout) => frame_rx.recv_timeout(timeout),
            None => frame_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        let snapshot = match received {
            Ok(timed) => {
                let (elapsed, dt) = clock.on_frame(timed.timestamp);
                puppeteer.on_frame(&timed.frame, elapsed, dt)
            }
            Err(RecvTimeoutError::Timeout) => {
                let (elapsed, dt) = clock.on_gap();
                puppeteer.advance(elapsed, dt)
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        log::debug!(
            "{} body={:.3} head_y={:.3} arms=({:.3}, {:.3})",
            snapshot.display_text(),
            snapshot.state.body_z,
            snapshot.state.head.y,
            snapshot.state.left_arm_z,
            snapshot.state.right_arm_z,
        );
        on_snapshot(&snapshot)?;
    }

    Ok(())
}
