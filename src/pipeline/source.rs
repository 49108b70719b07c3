use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use crossbeam_channel::{SendTimeoutError, Sender};
use serde::Deserialize;

use crate::{error::PuppetError, landmarks::LandmarkFrame};

const SEND_POLL: Duration = Duration::from_millis(50);
// Long pauses in a recording are replayed at most this long.
const MAX_REPLAY_GAP: Duration = Duration::from_secs(2);

/// A frame plus the capture time the tracker reported, in seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimedFrame {
    pub timestamp: Option<f64>,
    pub frame: LandmarkFrame,
}

pub trait LandmarkSource: Send + 'static {
    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<TimedFrame>>;

    fn label(&self) -> &str;

    /// Records dropped because they could not be parsed.
    fn skipped(&self) -> usize {
        0
    }
}

#[derive(Deserialize)]
struct RecordedLine {
    #[serde(default, alias = "timestamp")]
    t: Option<f64>,
    #[serde(flatten)]
    frame: LandmarkFrame,
}

/// Parse one JSON-lines record. Blank lines yield `None`.
pub fn parse_recording_line(
    line: &str,
    line_no: usize,
) -> Result<Option<TimedFrame>, PuppetError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let record: RecordedLine = serde_json::from_str(trimmed).map_err(|source| {
        PuppetError::Recording {
            line: line_no,
            source,
        }
    })?;
    Ok(Some(TimedFrame {
        timestamp: record.t,
        frame: record.frame,
    }))
}

/// Replays a JSON-lines landmark recording.
pub struct RecordingSource<R> {
    reader: R,
    label: String,
    line_no: usize,
    skipped: usize,
}

impl RecordingSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open recording {}", path.display()))?;
        Ok(Self::from_reader(
            BufReader::new(file),
            path.display().to_string(),
        ))
    }
}

impl<R: BufRead> RecordingSource<R> {
    pub fn from_reader(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            line_no: 0,
            skipped: 0,
        }
    }
}

impl<R: BufRead + Send + 'static> LandmarkSource for RecordingSource<R> {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("failed to read {}", self.label))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            match parse_recording_line(&line, self.line_no) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => continue,
                Err(err) => {
                    self.skipped += 1;
                    log::warn!("skipping malformed frame in {}: {err}", self.label);
                }
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn skipped(&self) -> usize {
        self.skipped
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pacing {
    /// Sleep between frames according to their timestamps.
    Realtime,
    /// Hand frames over as fast as the driver takes them.
    Unpaced,
}

#[derive(Debug)]
pub struct LandmarkStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LandmarkStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LandmarkStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the source thread. Frames go out one at a time; each send blocks
/// until the driver has taken the previous frame.
pub fn start_landmark_stream<S: LandmarkSource>(
    mut source: S,
    frame_tx: Sender<TimedFrame>,
    pacing: Pacing,
    nominal_interval: Duration,
) -> LandmarkStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    log::info!("starting landmark source: {}", source.label());

    let handle = thread::spawn(move || {
        let mut last_timestamp: Option<f64> = None;
        let mut sent = 0u64;

        while !stop_flag.load(Ordering::Relaxed) {
            let timed = match source.next_frame() {
                Ok(Some(timed)) => timed,
                Ok(None) => {
                    log::info!(
                        "landmark source {} finished after {sent} frames ({} skipped)",
                        source.label(),
                        source.skipped()
                    );
                    break;
                }
                Err(err) => {
                    log::warn!("landmark source {} failed: {err:?}", source.label());
                    break;
                }
            };

            if pacing == Pacing::Realtime && sent > 0 {
                thread::sleep(replay_gap(last_timestamp, timed.timestamp, nominal_interval));
            }
            last_timestamp = timed.timestamp.or(last_timestamp);

            if !send_until_stopped(&frame_tx, timed, &stop_flag) {
                break;
            }
            sent += 1;
        }
    });

    LandmarkStream {
        stop,
        handle: Some(handle),
    }
}

fn replay_gap(previous: Option<f64>, current: Option<f64>, nominal: Duration) -> Duration {
    match (previous, current) {
        (Some(prev), Some(cur)) if cur > prev => {
            Duration::from_secs_f64(cur - prev).min(MAX_REPLAY_GAP)
        }
        _ => nominal,
    }
}

fn send_until_stopped(
    frame_tx: &Sender<TimedFrame>,
    mut timed: TimedFrame,
    stop: &AtomicBool,
) -> bool {
    loop {
        match frame_tx.send_timeout(timed, SEND_POLL) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(back)) => {
                if stop.load(Ordering::Relaxed) {
                    return false;
                }
                timed = back;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crossbeam_channel::bounded;

    use super::*;

    const RECORDING: &str = r#"{"t":0.0,"pose":[{"x":0.5,"y":0.4}]}

{"t":0.033,"rightHandLandmarks":[{"x":0.1,"y":0.2}]}
not json
{"timestamp":0.066}
"#;

    #[test]
    fn reads_frames_and_skips_bad_lines() {
        let mut source = RecordingSource::from_reader(Cursor::new(RECORDING), "inline");

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.timestamp, Some(0.0));
        assert_eq!(first.frame.pose().unwrap().len(), 1);

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.timestamp, Some(0.033));
        assert!(second.frame.right_hand.is_some());

        let third = source.next_frame().unwrap().unwrap();
        assert_eq!(third.timestamp, Some(0.066));
        assert!(third.frame.is_empty());

        assert!(source.next_frame().unwrap().is_none());
        let source: &dyn LandmarkSource = &source;
        assert_eq!(source.skipped(), 1);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_recording_line("{\"pose\": 3}", 7).unwrap_err();
        assert!(matches!(err, PuppetError::Recording { line: 7, .. }));
    }

    #[test]
    fn replay_gap_uses_timestamps() {
        let nominal = Duration::from_millis(33);
        assert_eq!(
            replay_gap(Some(1.0), Some(1.5), nominal),
            Duration::from_millis(500)
        );
        assert_eq!(replay_gap(None, Some(1.5), nominal), nominal);
        assert_eq!(replay_gap(Some(2.0), Some(1.0), nominal), nominal);
        assert_eq!(replay_gap(Some(0.0), Some(60.0), nominal), MAX_REPLAY_GAP);
    }

    #[test]
    fn stream_delivers_every_frame_in_order() {
        let source = RecordingSource::from_reader(Cursor::new(RECORDING), "inline");
        let (tx, rx) = bounded(1);
        let stream = start_landmark_stream(source, tx, Pacing::Unpaced, Duration::from_millis(1));

        let stamps: Vec<Option<f64>> = rx.iter().map(|timed| timed.timestamp).collect();
        assert_eq!(stamps, vec![Some(0.0), Some(0.033), Some(0.066)]);
        stream.stop();
    }
}
