//! Opening a video with FFmpeg.
//!
//! [`MediaFile`] holds the demuxer context for one video and the metadata
//! of its best video stream. The [`FrameSampler`](crate::FrameSampler)
//! borrows it mutably while decoding.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};

use crate::{error::SharpFramesError, metadata::VideoMetadata};

/// An opened video file.
pub struct MediaFile {
    pub(crate) input_context: Input,
    pub(crate) video_stream_index: usize,
    pub(crate) metadata: VideoMetadata,
    pub(crate) file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("file_path", &self.file_path)
            .field("video_stream_index", &self.video_stream_index)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open `path` and locate its best video stream.
    ///
    /// Initializes FFmpeg (idempotent) before opening.
    ///
    /// # Errors
    ///
    /// - [`SharpFramesError::FileOpen`] if FFmpeg cannot open or probe the
    ///   file, which is what happens for anything that is not a video.
    /// - [`SharpFramesError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SharpFramesError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| SharpFramesError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| SharpFramesError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| SharpFramesError::NoVideoStream(file_path.clone()))?;
        let video_stream_index = stream.index();

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                SharpFramesError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| SharpFramesError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        // Prefer the average rate; fall back to the stream's base rate.
        let frames_per_second = [stream.avg_frame_rate(), stream.rate()]
            .into_iter()
            .find(|rate| rate.numerator() > 0 && rate.denominator() > 0)
            .map(|rate| rate.numerator() as f64 / rate.denominator() as f64)
            .unwrap_or(0.0);

        let frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ if frames_per_second > 0.0 => {
                (duration.as_secs_f64() * frames_per_second).round() as u64
            }
            _ => 0,
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        Ok(Self {
            input_context,
            video_stream_index,
            metadata,
            file_path,
        })
    }

    /// Metadata of the selected video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path this file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}
