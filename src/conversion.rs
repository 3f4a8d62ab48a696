//! Internal helpers for pixel copying and timestamp conversion.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy plane 0 of an FFmpeg frame into a tightly-packed buffer, dropping
/// any per-row padding.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    pack_rows(
        video_frame.data(0),
        video_frame.stride(0),
        width as usize * bytes_per_pixel,
        height as usize,
    )
}

fn pack_rows(data: &[u8], stride: usize, row_bytes: usize, rows: usize) -> Vec<u8> {
    if stride == row_bytes {
        return data[..row_bytes * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Offset `pts` so the first frame of a stream sits at zero. Streams in
/// MPEG-TS and trimmed MP4 files rarely start at pts 0.
pub(crate) fn rebase_pts(pts: i64, stream_start: Option<i64>) -> i64 {
    match stream_start {
        Some(start) => pts.saturating_sub(start),
        None => pts,
    }
}

/// Presentation time of `pts`, clamped at zero.
pub(crate) fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    if time_base.denominator() == 0 {
        return Duration::ZERO;
    }
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    Duration::from_secs_f64(seconds.max(0.0))
}

/// Presentation time of the `index`th frame at a constant frame rate. Used
/// when the decoder does not report a timestamp.
pub(crate) fn frame_index_to_duration(index: u64, frames_per_second: f64) -> Duration {
    if frames_per_second <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(index as f64 / frames_per_second)
}
