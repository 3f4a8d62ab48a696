//! Video stream metadata.
//!
//! Read once by [`MediaFile::open`](crate::MediaFile::open) and cached for
//! the lifetime of the file handle.

use std::time::Duration;

/// Metadata for the selected video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, computed from duration and frame rate.
    pub frame_count: u64,
    /// Container-level duration. Zero when the container does not report one.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"av1"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Expected number of frames a stride of `n` would sample, if the frame
    /// count is known.
    pub fn expected_samples(&self, stride: u64) -> Option<u64> {
        if self.frame_count == 0 || stride == 0 {
            return None;
        }
        Some(self.frame_count.div_ceil(stride))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(frame_count: u64) -> VideoMetadata {
        VideoMetadata {
            width: 64,
            height: 48,
            frames_per_second: 25.0,
            frame_count,
            duration: Duration::from_millis(frame_count * 40),
            codec: "h264".to_string(),
        }
    }

    #[test]
    fn expected_samples_rounds_up() {
        assert_eq!(metadata(10).expected_samples(2), Some(5));
        assert_eq!(metadata(10).expected_samples(3), Some(4));
        assert_eq!(metadata(10).expected_samples(1), Some(10));
        assert_eq!(metadata(0).expected_samples(2), None);
    }
}
