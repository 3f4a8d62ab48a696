//! Frame selection rules.
//!
//! [`FrameSelector`] decides, for each decoded frame, whether it is kept,
//! skipped, or whether decoding can stop altogether. It never touches
//! FFmpeg, so sampling behaviour is testable on plain indices and
//! timestamps.
//!
//! Rules are applied in order:
//!
//! 1. frames presented before `start` are skipped;
//! 2. the first frame presented at or after `end` stops the stream;
//! 3. in interval mode a frame is taken only if at least the interval has
//!    passed since the previously taken frame;
//! 4. in stride mode a frame is taken only if its index is a multiple of N.
//!
//! Stride indices are absolute (counted from the first decoded frame), so a
//! start offset does not shift which indices are eligible.

use std::time::Duration;

use crate::configuration::{Configuration, Sampling};

/// Outcome of [`FrameSelector::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Keep this frame.
    Take,
    /// Drop this frame and keep decoding.
    Skip,
    /// Drop this frame and everything after it.
    Stop,
}

/// Stateful frame filter for one pass over one video.
#[derive(Debug, Clone)]
pub struct FrameSelector {
    sampling: Sampling,
    start: Option<Duration>,
    end: Option<Duration>,
    last_taken: Option<Duration>,
}

impl FrameSelector {
    pub fn new(sampling: Sampling, start: Option<Duration>, end: Option<Duration>) -> Self {
        Self {
            sampling,
            start,
            end,
            last_taken: None,
        }
    }

    /// Build a selector from the sampling fields of a [`Configuration`].
    pub fn from_configuration(config: &Configuration) -> Self {
        Self::new(config.sampling, config.start, config.end)
    }

    /// Decide the fate of the frame at `index`, presented at `timestamp`.
    ///
    /// Calls must be made in decode order.
    pub fn select(&mut self, index: u64, timestamp: Duration) -> Selection {
        if self.start.is_some_and(|start| timestamp < start) {
            return Selection::Skip;
        }

        if self.end.is_some_and(|end| timestamp >= end) {
            return Selection::Stop;
        }

        match self.sampling {
            Sampling::EveryInterval(interval) => {
                if let Some(last) = self.last_taken {
                    if timestamp.saturating_sub(last) < interval {
                        return Selection::Skip;
                    }
                }
                self.last_taken = Some(timestamp);
                Selection::Take
            }
            Sampling::EveryNthFrame(stride) => {
                if index % stride.max(1) == 0 {
                    Selection::Take
                } else {
                    Selection::Skip
                }
            }
        }
    }

    /// Forget interval state so the selector can drive a fresh pass.
    pub fn reset(&mut self) {
        self.last_taken = None;
    }
}
