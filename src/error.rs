//! Error types for the `sharpframes` crate.
//!
//! [`SharpFramesError`] is returned by every fallible operation. Only
//! `InvalidArgument` and `NotFound` abort a batch; the
//! [`Extractor`](crate::Extractor) records every other failure against the
//! video it concerns.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `sharpframes` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SharpFramesError {
    /// A configuration value was rejected before any work started.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The input path does not exist.
    #[error("Input path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    DecodeError(String),

    /// The requested start or end offset lies beyond the end of the video.
    #[error("Offset {requested:?} exceeds the video duration ({duration:?})")]
    WindowOutOfBounds {
        /// The offending offset.
        requested: Duration,
        /// Duration of the video as reported by the container.
        duration: Duration,
    },

    /// An output image could not be written.
    #[error("Failed to write {path}: {reason}")]
    WriteError {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying reason for the failure.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading the input tree.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for SharpFramesError {
    fn from(error: FfmpegError) -> Self {
        SharpFramesError::FfmpegError(error.to_string())
    }
}
