//! FrameSampler integration tests.
//!
//! Tests require `tests/fixtures/sample_video.mp4` (and `sample_video.ts`
//! for the MPEG-TS cases) and return early when a fixture is absent.

use std::{path::Path, time::Duration};

use sharpframes::{
    FrameOutputOptions, FrameSampler, FrameSelector, MediaFile, PixelFormat, Sampling,
    SharpFramesError,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const SAMPLE_TRANSPORT_STREAM: &str = "tests/fixtures/sample_video.ts";

fn sample_indices(stride: u64) -> Vec<u64> {
    let mut media = MediaFile::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(stride), None, None);
    FrameSampler::new(&mut media, selector, FrameOutputOptions::default())
        .expect("Failed to create sampler")
        .map(|frame| frame.expect("Decode error").index)
        .collect()
}

#[test]
fn stride_yields_ceiling_of_frame_count() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let all = sample_indices(1);
    assert!(!all.is_empty());
    let decoded = all.len() as u64;

    for stride in [2, 3, 7] {
        let indices = sample_indices(stride);
        assert_eq!(indices.len() as u64, decoded.div_ceil(stride));
        let expected: Vec<u64> = (0..indices.len() as u64).map(|i| i * stride).collect();
        assert_eq!(indices, expected);
    }
}

#[test]
fn timestamps_are_non_decreasing() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut media = MediaFile::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(5), None, None);
    let timestamps: Vec<Duration> =
        FrameSampler::new(&mut media, selector, FrameOutputOptions::default())
            .expect("Failed to create sampler")
            .map(|frame| frame.expect("Decode error").timestamp)
            .collect();

    for window in timestamps.windows(2) {
        assert!(window[1] >= window[0]);
    }
}

#[test]
fn end_offset_stops_early() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let end = Duration::from_millis(400);
    let mut media = MediaFile::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(1), None, Some(end));
    let frames: Vec<_> = FrameSampler::new(&mut media, selector, FrameOutputOptions::default())
        .expect("Failed to create sampler")
        .collect::<Result<_, _>>()
        .expect("Decode error");

    assert!(!frames.is_empty());
    assert!(frames.iter().all(|frame| frame.timestamp < end));
}

#[test]
fn transport_stream_timestamps_start_at_zero() {
    if !Path::new(SAMPLE_TRANSPORT_STREAM).exists() {
        return;
    }

    let mut media = MediaFile::open(SAMPLE_TRANSPORT_STREAM).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(1), None, None);
    let first = FrameSampler::new(&mut media, selector, FrameOutputOptions::default())
        .expect("Failed to create sampler")
        .next()
        .expect("Expected a frame")
        .expect("Decode error");

    assert_eq!(first.index, 0);
    assert!(
        first.timestamp < Duration::from_millis(100),
        "First frame at {:?}",
        first.timestamp
    );
}

#[test]
fn transport_stream_window_yields_frames() {
    if !Path::new(SAMPLE_TRANSPORT_STREAM).exists() {
        return;
    }

    let start = Duration::from_millis(200);
    let end = Duration::from_millis(400);
    let mut media = MediaFile::open(SAMPLE_TRANSPORT_STREAM).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(1), Some(start), Some(end));
    let frames: Vec<_> = FrameSampler::new(&mut media, selector, FrameOutputOptions::default())
        .expect("Failed to create sampler")
        .collect::<Result<_, _>>()
        .expect("Decode error");

    // 30 fps over a 200 ms window.
    assert!(frames.len() >= 5, "Got {} frame(s)", frames.len());
    assert!(
        frames
            .iter()
            .all(|frame| frame.timestamp >= start && frame.timestamp < end)
    );
    assert!(frames[0].index > 0);
}

#[test]
fn grayscale_output_option() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let options = FrameOutputOptions {
        pixel_format: PixelFormat::Gray8,
        width: Some(64),
        ..FrameOutputOptions::default()
    };

    let mut media = MediaFile::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let selector = FrameSelector::new(Sampling::EveryNthFrame(1), None, None);
    let frame = FrameSampler::new(&mut media, selector, options)
        .expect("Failed to create sampler")
        .next()
        .expect("Expected a frame")
        .expect("Decode error");

    assert!(matches!(frame.image, image::DynamicImage::ImageLuma8(_)));
    assert_eq!(frame.image.width(), 64);
}

#[test]
fn metadata_is_populated() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let media = MediaFile::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let metadata = media.metadata();
    assert!(metadata.width > 0 && metadata.height > 0);
    assert!(metadata.frames_per_second > 0.0);
    assert!(metadata.frame_count > 0);
}

#[test]
fn open_invalid_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("invalid.mp4");
    std::fs::write(&path, b"this is not a media file").expect("Failed to write file");

    let error = MediaFile::open(&path).unwrap_err();
    assert!(matches!(error, SharpFramesError::FileOpen { .. }));
    assert!(error.to_string().contains("Failed to open media file"));
}
