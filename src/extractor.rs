//! The batch pipeline.
//!
//! [`Extractor::run`] walks the input, and for each video: opens it, samples
//! frames, scores them, and writes the sharp ones. Videos are handled one
//! after another on the calling thread.
//!
//! Failure policy:
//!
//! | Failure | Effect |
//! |---------|--------|
//! | invalid configuration, missing input | `run` returns `Err` before writing anything |
//! | video cannot be opened, has no video stream, start offset past its end | video `Skipped`, batch continues |
//! | decode error mid-stream | video `Truncated`, frames already written are kept, batch continues |
//! | image cannot be written | rest of the video abandoned (`WriteFailed`), batch continues |

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    configuration::{Configuration, Sampling},
    enumerator::{VideoEnumerator, VideoFile},
    error::SharpFramesError,
    media::MediaFile,
    progress::{NoOpProgress, ProgressCallback, ProgressTracker},
    sampler::FrameSampler,
    selection::FrameSelector,
    sharpness::{BlurFilter, BlurVerdict},
    writer::ImageWriter,
};

/// How processing of one video ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Every selected frame was decoded and handled.
    Completed,
    /// Decoding failed part-way; earlier frames were kept.
    Truncated(String),
    /// The video was not processed at all.
    Skipped(String),
    /// Writing an image failed; the rest of the video was abandoned.
    WriteFailed(String),
}

/// Counters and outcome for one video.
#[derive(Debug, Clone)]
pub struct VideoReport {
    pub video: PathBuf,
    /// Frames the selector accepted.
    pub sampled: u64,
    /// Frames written to disk.
    pub saved: u64,
    /// Frames rejected by the blur filter.
    pub blurry: u64,
    pub outcome: VideoOutcome,
}

impl VideoReport {
    fn new(video: &Path) -> Self {
        Self {
            video: video.to_path_buf(),
            sampled: 0,
            saved: 0,
            blurry: 0,
            outcome: VideoOutcome::Completed,
        }
    }

    fn skipped(video: &Path, reason: String) -> Self {
        Self {
            outcome: VideoOutcome::Skipped(reason),
            ..Self::new(video)
        }
    }
}

/// Summary of a whole run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub videos: Vec<VideoReport>,
}

impl BatchReport {
    pub fn total_saved(&self) -> u64 {
        self.videos.iter().map(|video| video.saved).sum()
    }

    pub fn total_blurry(&self) -> u64 {
        self.videos.iter().map(|video| video.blurry).sum()
    }

    /// Whether any video ended with a write failure.
    pub fn has_write_failures(&self) -> bool {
        self.videos
            .iter()
            .any(|video| matches!(video.outcome, VideoOutcome::WriteFailed(_)))
    }
}

/// Runs one batch described by a [`Configuration`].
pub struct Extractor {
    config: Configuration,
    filter: BlurFilter,
    writer: ImageWriter,
    progress: Arc<dyn ProgressCallback>,
}

impl Extractor {
    pub fn new(config: Configuration) -> Self {
        Self {
            filter: BlurFilter::new(config.blur_threshold),
            writer: ImageWriter::from_configuration(&config),
            progress: Arc::new(NoOpProgress),
            config,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Process every video under the configured input.
    ///
    /// # Errors
    ///
    /// Only configuration problems are returned: [`SharpFramesError::NotFound`]
    /// and [`SharpFramesError::InvalidArgument`]. Failures concerning a single
    /// video are recorded in its [`VideoReport`].
    pub fn run(&self) -> Result<BatchReport, SharpFramesError> {
        self.config.validate()?;
        let enumerator = VideoEnumerator::new(&self.config.input, self.config.recursive)?;

        let mut report = BatchReport::default();
        for video in &enumerator {
            report.videos.push(self.process_video(&video));
        }

        log::info!(
            "Processed {} video(s): {} image(s) saved, {} blurry frame(s) skipped",
            report.videos.len(),
            report.total_saved(),
            report.total_blurry()
        );
        Ok(report)
    }

    /// Sample, filter and write a single video.
    pub fn process_video(&self, video: &VideoFile) -> VideoReport {
        let mut media = match MediaFile::open(video.path()) {
            Ok(media) => media,
            Err(error) => {
                log::warn!("'{}' is not a supported video: {error}", video.path().display());
                return VideoReport::skipped(video.path(), error.to_string());
            }
        };

        let metadata = media.metadata().clone();
        log::info!(
            "Process '{}' | FPS: {:.3} | {}x{} [{}]",
            video.path().display(),
            metadata.frames_per_second,
            metadata.width,
            metadata.height,
            metadata.codec
        );
        log::info!(
            "Total frames: {} | Duration: {} ms",
            metadata.frame_count,
            metadata.duration.as_millis()
        );

        if let Some(start) = self.config.start {
            if !metadata.duration.is_zero() && start > metadata.duration {
                let error = SharpFramesError::WindowOutOfBounds {
                    requested: start,
                    duration: metadata.duration,
                };
                log::warn!("Skipping '{}': {error}", video.path().display());
                return VideoReport::skipped(video.path(), error.to_string());
            }
        }

        let selector = FrameSelector::from_configuration(&self.config);
        let sampler =
            match FrameSampler::new(&mut media, selector, self.config.frame_output.clone()) {
                Ok(sampler) => sampler,
                Err(error) => {
                    log::warn!("Cannot decode '{}': {error}", video.path().display());
                    return VideoReport::skipped(video.path(), error.to_string());
                }
            };

        let expected = match (self.config.sampling, self.config.start, self.config.end) {
            (Sampling::EveryNthFrame(stride), None, None) => metadata.expected_samples(stride),
            _ => None,
        };

        let mut report = VideoReport::new(video.path());
        let mut tracker = ProgressTracker::start(self.progress.clone(), video.path(), expected);

        for frame in sampler {
            let frame = match frame {
                Ok(frame) => frame,
                Err(error) => {
                    log::warn!(
                        "Decoding '{}' stopped early after {} sampled frame(s): {error}",
                        video.path().display(),
                        report.sampled
                    );
                    report.outcome = VideoOutcome::Truncated(error.to_string());
                    break;
                }
            };

            report.sampled += 1;
            let verdict = self.filter.assess(&frame.image);
            tracker.advance(frame.index, verdict);

            if let BlurVerdict::Blurry(score) = verdict {
                log::info!(
                    "Skip frame {} since laplacian variance is lower than the threshold ({score} < {}) [blurry frame]",
                    frame.index,
                    self.filter.threshold().unwrap_or_default()
                );
                report.blurry += 1;
                continue;
            }

            match self.writer.write(video, frame.index, &frame.image) {
                Ok(path) => {
                    log::info!("Saved '{}'", path.display());
                    report.saved += 1;
                }
                Err(error) => {
                    log::error!(
                        "Abandoning '{}' after a write failure: {error}",
                        video.path().display()
                    );
                    report.outcome = VideoOutcome::WriteFailed(error.to_string());
                    break;
                }
            }
        }

        tracker.finish();
        log::info!("Finish process '{}'", video.path().display());
        report
    }
}
