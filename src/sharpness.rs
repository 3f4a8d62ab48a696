//! Blur detection by variance of the Laplacian.
//!
//! A sharp image has strong local intensity changes, which the 4-neighbour
//! Laplacian turns into a wide spread of responses. A blurry or flat image
//! produces responses clustered around zero. The variance of the response
//! map is therefore a scalar sharpness score: higher means sharper.
//!
//! Borders are handled by reflect-101 (`dcb|abcd|cba`). Colour frames are
//! reduced to luma with the BT.601 weights (0.299, 0.587, 0.114) in 14-bit
//! fixed point. Both choices match OpenCV's defaults, so thresholds tuned
//! with `cv2.Laplacian(gray, cv2.CV_64F).var()` carry over.
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, GrayImage, Luma};
//! use sharpframes::{BlurFilter, BlurVerdict};
//!
//! let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(8, 8, Luma([128])));
//! let filter = BlurFilter::new(Some(100.0));
//! assert!(matches!(filter.assess(&flat), BlurVerdict::Blurry(_)));
//! ```

use std::{
    borrow::Cow,
    fmt::{Display, Formatter, Result as FmtResult},
};

use image::{DynamicImage, GrayImage, Luma};

/// Variance of the Laplacian response of an image.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SharpnessScore(pub f64);

impl SharpnessScore {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Display for SharpnessScore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:.2}", self.0)
    }
}

/// Reflect-101 index into `0..len`. `len` must be non-zero.
fn reflect_101(position: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let wrapped = position.rem_euclid(period);
    let reflected = if wrapped >= len { period - wrapped } else { wrapped };
    reflected as usize
}

/// BT.601 luma of an 8-bit RGB pixel, rounded the way OpenCV's
/// `COLOR_RGB2GRAY` rounds.
fn bt601_luma(red: u8, green: u8, blue: u8) -> u8 {
    const RED: u32 = 4899;
    const GREEN: u32 = 9617;
    const BLUE: u32 = 1868;
    let weighted = RED * red as u32 + GREEN * green as u32 + BLUE * blue as u32;
    ((weighted + (1 << 13)) >> 14) as u8
}

/// Reduce any frame to 8-bit luma. Gray frames are borrowed as they are.
fn to_luma(image: &DynamicImage) -> Cow<'_, GrayImage> {
    match image {
        DynamicImage::ImageLuma8(gray) => Cow::Borrowed(gray),
        other => {
            let rgb = other.to_rgb8();
            Cow::Owned(GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [red, green, blue] = rgb.get_pixel(x, y).0;
                Luma([bt601_luma(red, green, blue)])
            }))
        }
    }
}

/// Compute the sharpness score of a grayscale image.
///
/// Applies the kernel `[0 1 0; 1 -4 1; 0 1 0]` at every pixel and returns
/// the population variance of the responses. An empty image scores zero.
pub fn laplacian_variance(image: &GrayImage) -> SharpnessScore {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return SharpnessScore(0.0);
    }

    let (w, h) = (width as i64, height as i64);
    let pixels = image.as_raw();
    let at = |x: i64, y: i64| -> f64 {
        let column = reflect_101(x, w);
        let row = reflect_101(y, h);
        pixels[row * width as usize + column] as f64
    };

    let count = (width as u64 * height as u64) as f64;
    let mut sum = 0.0;
    let mut sum_of_squares = 0.0;

    for y in 0..h {
        for x in 0..w {
            let response =
                at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4.0 * at(x, y);
            sum += response;
            sum_of_squares += response * response;
        }
    }

    let mean = sum / count;
    SharpnessScore((sum_of_squares / count - mean * mean).max(0.0))
}

/// Result of running a frame through a [`BlurFilter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlurVerdict {
    /// The score met the threshold.
    Sharp(SharpnessScore),
    /// The score fell below the threshold.
    Blurry(SharpnessScore),
    /// The filter is disabled; no score was computed.
    Unchecked,
}

impl BlurVerdict {
    /// Whether the frame should be written.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, BlurVerdict::Blurry(_))
    }
}

/// Accept/reject decision against a fixed sharpness threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurFilter {
    threshold: Option<f64>,
}

impl BlurFilter {
    /// `None` disables the filter: every frame is accepted unscored.
    pub fn new(threshold: Option<f64>) -> Self {
        Self { threshold }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Score `image` and compare it with the threshold.
    ///
    /// Frames scoring strictly below the threshold are blurry.
    pub fn assess(&self, image: &DynamicImage) -> BlurVerdict {
        let Some(threshold) = self.threshold else {
            return BlurVerdict::Unchecked;
        };

        let score = laplacian_variance(&to_luma(image));

        if score.value() < threshold {
            BlurVerdict::Blurry(score)
        } else {
            BlurVerdict::Sharp(score)
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgb, RgbImage};

    use super::*;

    fn checkerboard(size: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    /// Horizontal ramp with a gentle slope: second derivative is zero
    /// everywhere except at the reflected borders.
    fn ramp(size: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, _| Luma([(x * 2) as u8]))
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_the_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-1, 1), 0);
    }

    #[test]
    fn flat_image_scores_zero() {
        let flat = GrayImage::from_pixel(16, 16, Luma([77]));
        assert_eq!(laplacian_variance(&flat), SharpnessScore(0.0));
    }

    #[test]
    fn empty_image_scores_zero() {
        assert_eq!(laplacian_variance(&GrayImage::new(0, 0)), SharpnessScore(0.0));
    }

    #[test]
    fn single_pixel_scores_zero() {
        let pixel = GrayImage::from_pixel(1, 1, Luma([200]));
        assert_eq!(laplacian_variance(&pixel), SharpnessScore(0.0));
    }

    #[test]
    fn checkerboard_is_sharper_than_ramp() {
        let sharp = laplacian_variance(&checkerboard(32, 1));
        let smooth = laplacian_variance(&ramp(32));
        assert!(sharp > smooth, "{sharp} should exceed {smooth}");
        assert!(sharp.value() > 100.0);
    }

    #[test]
    fn one_pixel_checkerboard_has_known_score() {
        // Every response is ±1020, so the variance is 1020².
        let score = laplacian_variance(&checkerboard(8, 1));
        assert!((score.value() - 1020.0 * 1020.0).abs() < 1e-6);
    }

    #[test]
    fn disabled_filter_accepts_everything() {
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([0])));
        let verdict = BlurFilter::disabled().assess(&flat);
        assert_eq!(verdict, BlurVerdict::Unchecked);
        assert!(verdict.is_accepted());
    }

    #[test]
    fn threshold_splits_sharp_from_blurry() {
        let filter = BlurFilter::new(Some(100.0));
        let sharp = DynamicImage::ImageLuma8(checkerboard(16, 2));
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([10])));

        assert!(filter.assess(&sharp).is_accepted());
        assert!(!filter.assess(&flat).is_accepted());
    }

    #[test]
    fn score_equal_to_threshold_is_sharp() {
        let filter = BlurFilter::new(Some(0.0));
        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([10])));
        assert_eq!(filter.assess(&flat), BlurVerdict::Sharp(SharpnessScore(0.0)));
    }

    #[test]
    fn rgb_frames_are_scored_on_luma() {
        let rgb = RgbImage::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let verdict = BlurFilter::new(Some(100.0)).assess(&DynamicImage::ImageRgb8(rgb));
        assert!(matches!(verdict, BlurVerdict::Sharp(_)));
    }

    #[test]
    fn luma_uses_bt601_weights() {
        assert_eq!(bt601_luma(255, 0, 0), 76);
        assert_eq!(bt601_luma(0, 255, 0), 150);
        assert_eq!(bt601_luma(0, 0, 255), 29);
        assert_eq!(bt601_luma(255, 255, 255), 255);
        assert_eq!(bt601_luma(0, 0, 0), 0);
    }

    #[test]
    fn red_blue_checkerboard_scores_on_bt601_luma() {
        // Red and blue reduce to 76 and 29, so every response is ±4·47.
        let rgb = RgbImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let image = DynamicImage::ImageRgb8(rgb);
        let luma = to_luma(&image);
        let score = laplacian_variance(&luma);
        assert!((score.value() - 188.0 * 188.0).abs() < 1e-6, "got {score}");
    }

    #[test]
    fn gray_frames_are_not_copied() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        assert!(matches!(to_luma(&gray), Cow::Borrowed(_)));
    }

    #[test]
    fn assessment_is_deterministic() {
        let filter = BlurFilter::new(Some(50.0));
        let image = DynamicImage::ImageLuma8(checkerboard(24, 3));
        assert_eq!(filter.assess(&image), filter.assess(&image));
    }
}
