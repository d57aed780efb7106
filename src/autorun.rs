use crate::error::Error;
use crate::frame::Frame;
use crate::record::FrameMeasurement;
use crate::track::TrackHistory;
use crate::tracker::Tracker;
use crate::trajectory::TrajectoryTable;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Random access to the frames of one sequence.
pub trait FrameSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn frame(&mut self, index: usize) -> Result<Frame, Error>;
}

impl FrameSource for Vec<Frame> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, Error> {
        let len = self.as_slice().len();

        self.get(index)
            .cloned()
            .ok_or(Error::FrameOutOfRange { index, len })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    pub start: usize,
    /// Exclusive; `None` runs to the end of the source.
    pub end: Option<usize>,
    /// Frames left out between two measured frames.
    pub skip_frames: usize,
    /// Pause after each frame, in milliseconds.
    pub delay_ms: u64,
}

/// Shared flag stopping a run before its next frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames committed to the table.
    pub measured: usize,
    /// Committed frames where no identity was detected.
    pub undetected: usize,
    pub cancelled: bool,
}

/// Unattended, strictly sequential tracking over a frame range.
///
/// Each frame is committed before the seed of the next one is computed, and
/// cancellation is only observed between frames, so the table never holds a
/// half-written frame.
pub struct AutoRun<'a> {
    tracker: &'a Tracker,
    config: RunConfig,
    initial: na::Point2<f32>,
    history: TrackHistory,
    cancel: CancelToken,
}

impl<'a> AutoRun<'a> {
    pub fn new(tracker: &'a Tracker, config: RunConfig, initial: na::Point2<f32>) -> Self {
        Self {
            tracker,
            config,
            initial,
            history: TrackHistory::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Continues from the positions accepted by an earlier run.
    pub fn with_history(mut self, history: TrackHistory) -> Self {
        self.history = history;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[inline]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    #[inline]
    pub fn history(&self) -> &TrackHistory {
        &self.history
    }

    /// Measures one frame at the extrapolated seed and accepts the result.
    pub fn step(&mut self, frame: &Frame) -> FrameMeasurement {
        let seed = self.tracker.next_seed(&self.history, self.initial);
        let measurement = self.tracker.measure(frame, seed, &self.history);

        self.history.push(&measurement);

        measurement
    }

    pub fn run<S>(&mut self, source: &mut S, table: &mut TrajectoryTable) -> Result<RunSummary, Error>
    where
        S: FrameSource + ?Sized,
    {
        let len = source.len();
        let start = self.config.start;

        if start >= len {
            return Err(Error::FrameOutOfRange { index: start, len });
        }

        let end = self.config.end.map_or(len, |end| end.min(len));
        let stride = self.config.skip_frames + 1;
        let delay = Duration::from_millis(self.config.delay_ms);

        log::info!("auto-run over frames {}..{} (every {})", start, end, stride);

        table.begin_run();

        let mut summary = RunSummary::default();

        for index in (start..end).step_by(stride) {
            if self.cancel.is_cancelled() {
                log::info!("auto-run cancelled before frame {}", index);
                summary.cancelled = true;
                break;
            }

            let frame = source.frame(index)?;
            let measurement = self.step(&frame);

            table.commit(index, measurement)?;

            summary.measured += 1;
            if !measurement.any_detected() {
                summary.undetected += 1;
            }

            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }

        log::info!(
            "auto-run done: {} frame(s) measured, {} without detection",
            summary.measured,
            summary.undetected
        );

        Ok(summary)
    }
}
