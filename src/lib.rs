//! # sharpframes
//!
//! Extract frames from a directory of videos and keep only the sharp ones.
//!
//! Each video is decoded through FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)). Every Nth frame,
//! or one frame per time interval, is sampled. Each sample is scored by the
//! variance of its Laplacian and written as a PNG or JPEG when it is sharp
//! enough.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sharpframes::{Configuration, Extractor, Sampling};
//!
//! let config = Configuration::new("videos")
//!     .with_output("frames")
//!     .with_sampling(Sampling::EveryNthFrame(10))
//!     .with_blur_threshold(Some(100.0));
//!
//! let report = Extractor::new(config).run()?;
//! println!("saved {} images", report.total_saved());
//! # Ok::<(), sharpframes::SharpFramesError>(())
//! ```
//!
//! ## Building blocks
//!
//! - [`VideoEnumerator`]: lazy, restartable discovery of video files
//! - [`FrameSelector`]: stride / interval / start–end rules, FFmpeg-free
//! - [`FrameSampler`]: lazy iterator of decoded, selected frames
//! - [`BlurFilter`] and [`laplacian_variance`]: sharpness scoring
//! - [`ImageWriter`]: deterministic, idempotent file naming
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

pub mod configuration;
mod conversion;
pub mod enumerator;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod selection;
pub mod sharpness;
pub mod writer;

pub use configuration::{
    Configuration, DEFAULT_BLUR_THRESHOLD, DEFAULT_OUTPUT_DIRECTORY, DEFAULT_SKIP_INTERVAL,
    FrameOutputOptions, ImageFormat, OutputLayout, PixelFormat, Sampling,
};
pub use enumerator::{VideoEnumerator, VideoFile, VideoFiles};
pub use error::SharpFramesError;
pub use extractor::{BatchReport, Extractor, VideoOutcome, VideoReport};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::MediaFile;
pub use metadata::VideoMetadata;
pub use progress::{ProgressCallback, ProgressEvent, ProgressInfo};
pub use sampler::{FrameSampler, SampledFrame};
pub use selection::{FrameSelector, Selection};
pub use sharpness::{BlurFilter, BlurVerdict, SharpnessScore, laplacian_variance};
pub use writer::{ImageWriter, frame_file_name};
