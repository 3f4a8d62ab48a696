//! Run configuration.
//!
//! [`Configuration`] is the single immutable record that drives one batch.
//! It is assembled with `with_*` builder methods and checked once by
//! [`Configuration::validate`] before any file is touched.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use sharpframes::{Configuration, ImageFormat, Sampling};
//!
//! let config = Configuration::new("videos")
//!     .with_output("frames")
//!     .with_sampling(Sampling::EveryNthFrame(2))
//!     .with_blur_threshold(Some(100.0))
//!     .with_image_format(ImageFormat::Jpeg)
//!     .with_start(Some(Duration::from_millis(500)));
//!
//! config.validate()?;
//! # Ok::<(), sharpframes::SharpFramesError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::format::Pixel;
use image::ImageFormat as EncodedFormat;

use crate::error::SharpFramesError;

/// Output directory used when none is given.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "./results";

/// Threshold applied when blur filtering is enabled without a value.
pub const DEFAULT_BLUR_THRESHOLD: f64 = 100.0;

/// Interval applied when time-based skipping is enabled without a value.
pub const DEFAULT_SKIP_INTERVAL: Duration = Duration::from_millis(1000);

/// Pixel format of decoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB (24 bpp). This is the default.
    #[default]
    Rgb8,
    /// 8-bit grayscale (8 bpp).
    Gray8,
}

impl PixelFormat {
    pub(crate) fn to_ffmpeg_pixel(self) -> Pixel {
        match self {
            PixelFormat::Rgb8 => Pixel::RGB24,
            PixelFormat::Gray8 => Pixel::GRAY8,
        }
    }

    pub(crate) fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Pixel format and resolution of decoded frames.
///
/// When no dimensions are set the source resolution is used. Setting one
/// dimension together with `maintain_aspect_ratio` computes the other.
#[derive(Debug, Clone)]
pub struct FrameOutputOptions {
    /// Output pixel format.
    pub pixel_format: PixelFormat,
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// Preserve the source aspect ratio when only one dimension is given.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb8,
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Resolve the final `(width, height)` given the source size.
    pub(crate) fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let h = (source_height as f64 * w as f64 / source_width as f64).round() as u32;
                (w, h.max(1))
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let w = (source_width as f64 * h as f64 / source_height as f64).round() as u32;
                (w.max(1), h)
            }
            (None, Some(h)) => (source_width, h),
            (None, None) => (source_width, source_height),
        }
    }
}

/// Encoded format of written images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// Baseline JPEG.
    Jpeg,
}

impl ImageFormat {
    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Parse a user-supplied extension (`png`, `jpg`, `jpeg`, with or
    /// without a leading dot).
    pub fn from_extension(value: &str) -> Option<Self> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    pub(crate) fn to_encoded_format(self) -> EncodedFormat {
        match self {
            ImageFormat::Png => EncodedFormat::Png,
            ImageFormat::Jpeg => EncodedFormat::Jpeg,
        }
    }
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.extension())
    }
}

/// Where images land inside the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// All images directly in the output directory.
    #[default]
    Flat,
    /// One subdirectory per video, named after the video's stem.
    Nested,
}

/// Which decoded frames are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    /// Keep frames whose 0-based index is a multiple of N.
    EveryNthFrame(u64),
    /// Keep at most one frame per interval of presentation time.
    EveryInterval(Duration),
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling::EveryNthFrame(1)
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
#[must_use]
pub struct Configuration {
    /// Video directory, or a single video file.
    pub input: PathBuf,
    /// Root directory for written images.
    pub output: PathBuf,
    /// Descend into subdirectories of `input`.
    pub recursive: bool,
    /// Frame sampling mode.
    pub sampling: Sampling,
    /// Skip frames presented before this offset.
    pub start: Option<Duration>,
    /// Stop at the first frame presented at or after this offset.
    pub end: Option<Duration>,
    /// Reject frames whose sharpness score is below this value. `None`
    /// disables the blur filter.
    pub blur_threshold: Option<f64>,
    /// Encoded format of written images.
    pub image_format: ImageFormat,
    /// Directory layout of written images.
    pub layout: OutputLayout,
    /// Decoded frame pixel format and resolution.
    pub frame_output: FrameOutputOptions,
    /// Whether per-video and per-frame messages should be shown. The
    /// library always logs them at info level; a front end uses this flag
    /// to pick its log filter, as the `sharpframes` binary does.
    pub verbose: bool,
}

impl Configuration {
    /// Create a configuration for `input` with default settings.
    ///
    /// Defaults: output to `./results`, every frame, no blur filter, PNG,
    /// flat layout, non-recursive.
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            recursive: false,
            sampling: Sampling::default(),
            start: None,
            end: None,
            blur_threshold: None,
            image_format: ImageFormat::default(),
            layout: OutputLayout::default(),
            frame_output: FrameOutputOptions::default(),
            verbose: false,
        }
    }

    pub fn with_output<P: AsRef<Path>>(mut self, output: P) -> Self {
        self.output = output.as_ref().to_path_buf();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_start(mut self, start: Option<Duration>) -> Self {
        self.start = start;
        self
    }

    pub fn with_end(mut self, end: Option<Duration>) -> Self {
        self.end = end;
        self
    }

    pub fn with_blur_threshold(mut self, threshold: Option<f64>) -> Self {
        self.blur_threshold = threshold;
        self
    }

    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_frame_output(mut self, options: FrameOutputOptions) -> Self {
        self.frame_output = options;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the configuration for values that can never produce output.
    ///
    /// # Errors
    ///
    /// - [`SharpFramesError::NotFound`] if `input` does not exist.
    /// - [`SharpFramesError::InvalidArgument`] for a zero stride, a zero
    ///   interval, a negative or non-finite blur threshold, or an end offset
    ///   that is not after the start offset.
    pub fn validate(&self) -> Result<(), SharpFramesError> {
        match self.sampling {
            Sampling::EveryNthFrame(0) => {
                return Err(SharpFramesError::InvalidArgument(
                    "stride must be greater than zero".to_string(),
                ));
            }
            Sampling::EveryInterval(interval) if interval.is_zero() => {
                return Err(SharpFramesError::InvalidArgument(
                    "skip interval must be greater than zero".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(threshold) = self.blur_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(SharpFramesError::InvalidArgument(format!(
                    "blur threshold must be a non-negative number, got {threshold}"
                )));
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end <= start {
                return Err(SharpFramesError::InvalidArgument(format!(
                    "end ({} ms) must be after start ({} ms)",
                    end.as_millis(),
                    start.as_millis()
                )));
            }
        }

        if !self.input.exists() {
            return Err(SharpFramesError::NotFound(self.input.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_dimensions_keeps_source_by_default() {
        let options = FrameOutputOptions::default();
        assert_eq!(options.resolve_dimensions(1920, 1080), (1920, 1080));
    }

    #[test]
    fn resolve_dimensions_preserves_aspect_ratio() {
        let options = FrameOutputOptions {
            width: Some(960),
            ..FrameOutputOptions::default()
        };
        assert_eq!(options.resolve_dimensions(1920, 1080), (960, 540));

        let options = FrameOutputOptions {
            height: Some(270),
            ..FrameOutputOptions::default()
        };
        assert_eq!(options.resolve_dimensions(1920, 1080), (480, 270));
    }

    #[test]
    fn resolve_dimensions_without_aspect_ratio() {
        let options = FrameOutputOptions {
            width: Some(100),
            maintain_aspect_ratio: false,
            ..FrameOutputOptions::default()
        };
        assert_eq!(options.resolve_dimensions(1920, 1080), (100, 1080));
    }

    #[test]
    fn image_format_extensions() {
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension(".JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }
}
