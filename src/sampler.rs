//! Lazy, pull-based frame sampling.
//!
//! [`FrameSampler`] implements [`Iterator`] and decodes on demand: each call
//! to [`next()`](Iterator::next) reads and decodes just enough packets to
//! reach the next frame the [`FrameSelector`] accepts. Nothing is buffered
//! beyond the decoder's own queue.
//!
//! A decode failure is yielded once as an `Err` and ends the iteration, so
//! frames produced before the failure remain usable.
//!
//! Timestamps are measured from the first frame of the stream, not from pts
//! zero, so start and end offsets mean the same thing for every container.
//!
//! # Example
//!
//! ```no_run
//! use sharpframes::{FrameOutputOptions, FrameSampler, FrameSelector, MediaFile, Sampling};
//!
//! let mut media = MediaFile::open("input.mp4")?;
//! let selector = FrameSelector::new(Sampling::EveryNthFrame(30), None, None);
//! let sampler = FrameSampler::new(&mut media, selector, FrameOutputOptions::default())?;
//!
//! for frame in sampler {
//!     let frame = frame?;
//!     frame.image.save(format!("frame_{}.png", frame.index))?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    ffi::AV_NOPTS_VALUE,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::error::EAGAIN,
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::{
    configuration::{FrameOutputOptions, PixelFormat},
    conversion::{frame_index_to_duration, frame_to_buffer, pts_to_duration, rebase_pts},
    error::SharpFramesError,
    media::MediaFile,
    selection::{FrameSelector, Selection},
};

/// One frame accepted by the selector.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// 0-based position of the frame in decode order.
    pub index: u64,
    /// Presentation time of the frame.
    pub timestamp: Duration,
    /// Decoded pixels.
    pub image: DynamicImage,
}

/// A lazy iterator over the frames of one video that pass a
/// [`FrameSelector`].
///
/// Borrows the [`MediaFile`] mutably. To sample the same video again, open
/// it again or build a new sampler after this one is dropped.
pub struct FrameSampler<'a> {
    media: &'a mut MediaFile,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    selector: FrameSelector,
    output_options: FrameOutputOptions,
    time_base: Rational,
    /// First pts of the stream, when the container reports one.
    stream_start: Option<i64>,
    frames_per_second: f64,
    target_width: u32,
    target_height: u32,
    next_index: u64,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameSampler<'a> {
    /// Prepare a decoder and scaler for the video stream of `media`.
    ///
    /// Decoding starts from the first packet of the file.
    ///
    /// # Errors
    ///
    /// Returns [`SharpFramesError::FfmpegError`] if the decoder or the
    /// scaler cannot be created.
    pub fn new(
        media: &'a mut MediaFile,
        selector: FrameSelector,
        output_options: FrameOutputOptions,
    ) -> Result<Self, SharpFramesError> {
        let stream = media
            .input_context
            .stream(media.video_stream_index)
            .ok_or_else(|| SharpFramesError::NoVideoStream(media.file_path.clone()))?;
        let time_base = stream.time_base();
        let stream_start = Some(stream.start_time()).filter(|start| *start != AV_NOPTS_VALUE);
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let (target_width, target_height) =
            output_options.resolve_dimensions(decoder.width(), decoder.height());

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            output_options.pixel_format.to_ffmpeg_pixel(),
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )?;

        let frames_per_second = media.metadata.frames_per_second;

        Ok(Self {
            media,
            decoder,
            scaler,
            selector,
            output_options,
            time_base,
            stream_start,
            frames_per_second,
            target_width,
            target_height,
            next_index: 0,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    /// Scale and convert the current `decoded_frame` to a `DynamicImage`.
    fn convert_current_frame(&mut self) -> Result<DynamicImage, SharpFramesError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let (width, height) = (self.target_width, self.target_height);
        let pixel_format = self.output_options.pixel_format;
        let buffer = frame_to_buffer(
            &self.scaled_frame,
            width,
            height,
            pixel_format.bytes_per_pixel(),
        );

        let image = match pixel_format {
            PixelFormat::Rgb8 => RgbImage::from_raw(width, height, buffer).map(DynamicImage::ImageRgb8),
            PixelFormat::Gray8 => {
                GrayImage::from_raw(width, height, buffer).map(DynamicImage::ImageLuma8)
            }
        };

        image.ok_or_else(|| {
            SharpFramesError::DecodeError(
                "Failed to construct image from decoded frame data".to_string(),
            )
        })
    }

    fn current_timestamp(&self, index: u64) -> Duration {
        match self.decoded_frame.timestamp() {
            Some(pts) => pts_to_duration(rebase_pts(pts, self.stream_start), self.time_base),
            None => frame_index_to_duration(index, self.frames_per_second),
        }
    }

    /// Read the next packet of the file and hand it to the decoder. Packets
    /// of other streams are dropped. At end of file the decoder is flushed.
    fn feed_decoder(&mut self) -> Result<(), SharpFramesError> {
        let mut packet = Packet::empty();
        match packet.read(&mut self.media.input_context) {
            Ok(()) => {
                if packet.stream() != self.media.video_stream_index {
                    return Ok(());
                }
                let index = self.next_index;
                self.decoder.send_packet(&packet).map_err(|error| {
                    SharpFramesError::DecodeError(format!("frame {index}: {error}"))
                })
            }
            Err(FfmpegError::Eof) => {
                self.decoder.send_eof()?;
                self.eof_sent = true;
                Ok(())
            }
            Err(error) => Err(SharpFramesError::DecodeError(format!(
                "read failed after frame {}: {error}",
                self.next_index
            ))),
        }
    }

    fn fail(&mut self, error: SharpFramesError) -> Option<Result<SampledFrame, SharpFramesError>> {
        self.done = true;
        Some(Err(error))
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<SampledFrame, SharpFramesError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            // Drain frames the decoder has already produced.
            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {}
                Err(error) if needs_more_input(&error) => {
                    if self.eof_sent {
                        self.done = true;
                        return None;
                    }
                    if let Err(error) = self.feed_decoder() {
                        return self.fail(error);
                    }
                    continue;
                }
                Err(error) => {
                    return self.fail(SharpFramesError::DecodeError(format!(
                        "frame {}: {error}",
                        self.next_index
                    )));
                }
            }

            let index = self.next_index;
            self.next_index += 1;
            let timestamp = self.current_timestamp(index);

            match self.selector.select(index, timestamp) {
                Selection::Skip => continue,
                Selection::Stop => {
                    self.done = true;
                    return None;
                }
                Selection::Take => {
                    return match self.convert_current_frame() {
                        Ok(image) => Some(Ok(SampledFrame {
                            index,
                            timestamp,
                            image,
                        })),
                        Err(error) => self.fail(error),
                    };
                }
            }
        }
    }
}

/// Whether a `receive_frame` error only means the decoder wants another
/// packet (or has been fully drained), as opposed to a real failure.
fn needs_more_input(error: &FfmpegError) -> bool {
    matches!(error, FfmpegError::Eof | FfmpegError::Other { errno: EAGAIN })
}
