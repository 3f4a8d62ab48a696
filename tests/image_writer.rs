//! ImageWriter integration tests.

use std::fs;

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use sharpframes::{ImageFormat, ImageWriter, OutputLayout, SharpFramesError, VideoFile};

fn sample_image(shade: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([shade, 0, 255 - shade])))
}

#[test]
fn creates_output_directory_on_first_write() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let output = directory.path().join("results");
    let writer = ImageWriter::new(&output, OutputLayout::Flat, ImageFormat::Png);
    let video = VideoFile::new("videos/a.mp4");

    assert!(!output.exists());
    let path = writer.write(&video, 4, &sample_image(10)).expect("Write failed");

    assert_eq!(path, output.join("a_0004.png"));
    let written = image::open(&path).expect("Written image should decode");
    assert_eq!((written.width(), written.height()), (8, 6));
}

#[test]
fn nested_layout_uses_video_subdirectory() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let writer = ImageWriter::new(directory.path(), OutputLayout::Nested, ImageFormat::Jpeg);
    let video = VideoFile::new("clips/holiday.mkv");

    let path = writer.write(&video, 12, &sample_image(99)).expect("Write failed");
    assert_eq!(path, directory.path().join("holiday").join("holiday_0012.jpg"));
    assert!(path.exists());
}

#[test]
fn rewriting_overwrites_the_same_file() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let writer = ImageWriter::new(directory.path(), OutputLayout::Flat, ImageFormat::Png);
    let video = VideoFile::new("a.mp4");

    let first = writer.write(&video, 0, &sample_image(0)).expect("Write failed");
    let second = writer.write(&video, 0, &sample_image(200)).expect("Write failed");

    assert_eq!(first, second);
    assert_eq!(fs::read_dir(directory.path()).unwrap().count(), 1);
    let pixel = image::open(&second).unwrap().to_rgb8().get_pixel(0, 0).0;
    assert_eq!(pixel, [200, 0, 55]);
}

#[test]
fn jpeg_accepts_frames_with_alpha() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let writer = ImageWriter::new(directory.path(), OutputLayout::Flat, ImageFormat::Jpeg);
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));

    let path = writer
        .write(&VideoFile::new("a.mp4"), 1, &image)
        .expect("Write failed");
    assert!(path.exists());
}

#[test]
fn unwritable_destination_is_a_write_error() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    // A regular file where the output directory should be.
    let blocker = directory.path().join("results");
    fs::write(&blocker, b"not a directory").unwrap();

    let writer = ImageWriter::new(&blocker, OutputLayout::Flat, ImageFormat::Png);
    let error = writer
        .write(&VideoFile::new("a.mp4"), 0, &sample_image(1))
        .unwrap_err();
    assert!(matches!(error, SharpFramesError::WriteError { .. }));
}
