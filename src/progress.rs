//! Progress reporting.
//!
//! The [`Extractor`](crate::Extractor) reports to a [`ProgressCallback`] as
//! it works through a batch. The CLI uses this to drive a progress bar;
//! library users can plug in their own sink.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sharpframes::{Configuration, Extractor, ProgressCallback, ProgressEvent};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, event: &ProgressEvent) {
//!         println!("{event:?}");
//!     }
//! }
//!
//! let report = Extractor::new(Configuration::new("videos"))
//!     .with_progress(Arc::new(PrintProgress))
//!     .run()?;
//! # Ok::<(), sharpframes::SharpFramesError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use crate::sharpness::BlurVerdict;

/// A snapshot of per-video progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Video being processed.
    pub video: PathBuf,
    /// Frames sampled from this video so far.
    pub sampled: u64,
    /// Frames expected to be sampled, if the frame count is known.
    pub expected: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `expected` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since this video was opened.
    pub elapsed: Duration,
    /// Index of the frame just handled.
    pub frame_index: u64,
    /// What the blur filter decided for that frame.
    pub verdict: BlurVerdict,
}

/// Events delivered to a [`ProgressCallback`].
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A video was opened and sampling is starting.
    VideoStarted {
        video: PathBuf,
        /// Expected number of sampled frames, if known.
        expected: Option<u64>,
    },
    /// One sampled frame was handled.
    Frame(ProgressInfo),
    /// The video is finished, successfully or not.
    VideoFinished { video: PathBuf },
}

/// Trait for receiving progress updates.
///
/// Callbacks observe but cannot halt the batch.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards all notifications. Default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Tracks timing for one video and emits events.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    video: PathBuf,
    expected: Option<u64>,
    sampled: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn start(
        callback: Arc<dyn ProgressCallback>,
        video: &Path,
        expected: Option<u64>,
    ) -> Self {
        callback.on_progress(&ProgressEvent::VideoStarted {
            video: video.to_path_buf(),
            expected,
        });
        Self {
            callback,
            video: video.to_path_buf(),
            expected,
            sampled: 0,
            start_time: Instant::now(),
        }
    }

    /// Record one sampled frame.
    pub(crate) fn advance(&mut self, frame_index: u64, verdict: BlurVerdict) {
        self.sampled += 1;

        let percentage = self
            .expected
            .filter(|&expected| expected > 0)
            .map(|expected| (self.sampled as f32 / expected as f32 * 100.0).min(100.0));

        self.callback.on_progress(&ProgressEvent::Frame(ProgressInfo {
            video: self.video.clone(),
            sampled: self.sampled,
            expected: self.expected,
            percentage,
            elapsed: self.start_time.elapsed(),
            frame_index,
            verdict,
        }));
    }

    pub(crate) fn finish(self) {
        self.callback.on_progress(&ProgressEvent::VideoFinished { video: self.video });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressCallback for Recorder {
        fn on_progress(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn tracker_emits_start_frames_and_finish() {
        let recorder = Arc::new(Recorder::default());
        let mut tracker = ProgressTracker::start(recorder.clone(), Path::new("a.mp4"), Some(4));
        tracker.advance(0, BlurVerdict::Unchecked);
        tracker.advance(2, BlurVerdict::Unchecked);
        tracker.finish();

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], ProgressEvent::VideoStarted { expected: Some(4), .. }));
        match &events[2] {
            ProgressEvent::Frame(info) => {
                assert_eq!(info.sampled, 2);
                assert_eq!(info.frame_index, 2);
                assert_eq!(info.percentage, Some(50.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(events[3], ProgressEvent::VideoFinished { .. }));
    }
}
