//! Image decoding and classifier input preparation.
//!
//! The classifier expects the torchvision evaluation transform:
//! - Resize so the shorter side equals `resize_edge` (aspect preserved)
//! - Center crop to `crop_size` x `crop_size`
//!
//! Only the part of the source that lands inside the crop window is resized,
//! so a 1x65535 upload costs no more than a square one. The result matches a
//! full resize followed by a crop to within about one resized pixel.
//! - Scale to [0, 1], then normalize each channel with mean/std
//! - NCHW layout: [1, 3, crop_size, crop_size]

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbImage};
use ndarray::Array4;
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::error::{VisionError, VisionResult};

/// Decode uploaded bytes into an RGB image.
///
/// The format is sniffed from the content, not from a file name.
pub fn decode_rgb(image_bytes: &[u8]) -> VisionResult<RgbImage> {
    Ok(decode_image(image_bytes)?.to_rgb8())
}

/// Decode uploaded bytes, rejecting empty images.
pub fn decode_image(image_bytes: &[u8]) -> VisionResult<DynamicImage> {
    let img = image::load_from_memory(image_bytes)?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(VisionError::decode(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Converts decoded images into normalized classifier tensors.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    /// Create a preprocessor, validating the configuration.
    pub fn new(config: PreprocessConfig) -> VisionResult<Self> {
        if config.crop_size == 0 {
            return Err(VisionError::invalid_config("crop_size must be positive"));
        }
        if config.resize_edge < config.crop_size {
            return Err(VisionError::invalid_config(format!(
                "resize_edge ({}) must be at least crop_size ({})",
                config.resize_edge, config.crop_size
            )));
        }
        if config.std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(VisionError::invalid_config(
                "channel std values must be finite and non-zero",
            ));
        }
        Ok(Self { config })
    }

    /// Decode and preprocess raw upload bytes.
    pub fn prepare(&self, image_bytes: &[u8]) -> VisionResult<Array4<f32>> {
        let rgb = decode_rgb(image_bytes)?;
        Ok(self.preprocess(&rgb))
    }

    /// Resize, center crop and normalize an RGB image.
    pub fn preprocess(&self, img: &RgbImage) -> Array4<f32> {
        let cropped = self.resize_and_crop(img);

        let crop = self.config.crop_size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, crop, crop));

        // HWC -> CHW with per-channel normalization
        for (x, y, pixel) in cropped.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                tensor[[0, c, y as usize, x as usize]] =
                    (value - self.config.mean[c]) / self.config.std[c];
            }
        }

        debug!(
            original_width = img.width(),
            original_height = img.height(),
            "Classifier input prepared"
        );

        tensor
    }

    /// Shorter-side resize followed by a `crop_size` center crop.
    fn resize_and_crop(&self, img: &RgbImage) -> RgbImage {
        let crop = self.config.crop_size;
        let (width, height) = img.dimensions();
        let (resized_width, resized_height) =
            resized_dimensions(width, height, self.config.resize_edge);

        // Crop window in resized coordinates
        let left = center_offset(resized_width, crop);
        let top = center_offset(resized_height, crop);

        let x = AxisWindow::new(left, crop, width, resized_width);
        let y = AxisWindow::new(top, crop, height, resized_height);

        let source =
            imageops::crop_imm(img, x.start, y.start, x.source_len(), y.source_len()).to_image();
        let window = if (x.scaled_len, y.scaled_len) == (x.source_len(), y.source_len()) {
            source
        } else {
            imageops::resize(&source, x.scaled_len, y.scaled_len, FilterType::Triangle)
        };

        imageops::crop_imm(&window, x.inner_offset, y.inner_offset, crop, crop).to_image()
    }
}

/// The slice of one source axis that covers a crop window of the resized axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisWindow {
    /// First source pixel
    start: u32,
    /// One past the last source pixel
    end: u32,
    /// Length of the slice after resizing
    scaled_len: u32,
    /// Crop offset inside the resized slice
    inner_offset: u32,
}

impl AxisWindow {
    fn new(offset: u32, crop: u32, source_len: u32, resized_len: u32) -> Self {
        let to_source = source_len as f64 / resized_len as f64;
        // Room for the resampling filter on both sides
        let border = to_source.ceil() as u32 + 1;

        let start = ((offset as f64 * to_source).floor() as u32).saturating_sub(border);
        let end = (((offset + crop) as f64 * to_source).ceil() as u32)
            .saturating_add(border)
            .min(source_len);

        let to_resized = resized_len as f64 / source_len as f64;
        let scaled_len = if start == 0 && end == source_len {
            resized_len
        } else {
            (((end - start) as f64 * to_resized).round() as u32).max(crop)
        };
        let inner_offset = (offset as f64 - start as f64 * to_resized)
            .round()
            .clamp(0.0, (scaled_len - crop) as f64) as u32;

        Self {
            start,
            end,
            scaled_len,
            inner_offset,
        }
    }

    fn source_len(&self) -> u32 {
        self.end - self.start
    }
}

/// Output dimensions for a shorter-side resize.
pub fn resized_dimensions(width: u32, height: u32, edge: u32) -> (u32, u32) {
    if width <= height {
        let long = (edge as u64 * height as u64 / width as u64) as u32;
        (edge, long)
    } else {
        let long = (edge as u64 * width as u64 / height as u64) as u32;
        (long, edge)
    }
}

/// Offset of a centered window, rounded half to even.
fn center_offset(size: u32, window: u32) -> u32 {
    if size <= window {
        return 0;
    }
    ((size - window) as f64 / 2.0).round_ties_even() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IMAGENET_MEAN, IMAGENET_STD};
    use image::{ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_resized_dimensions_portrait_and_landscape() {
        assert_eq!(resized_dimensions(100, 200, 256), (256, 512));
        assert_eq!(resized_dimensions(640, 480, 256), (341, 256));
        assert_eq!(resized_dimensions(300, 300, 256), (256, 256));
    }

    #[test]
    fn test_center_offset_rounds() {
        assert_eq!(center_offset(341, 224), 58);
        assert_eq!(center_offset(343, 224), 60);
        assert_eq!(center_offset(256, 224), 16);
        assert_eq!(center_offset(224, 224), 0);
    }

    #[test]
    fn test_output_shape() {
        let preprocessor = ImagePreprocessor::new(PreprocessConfig::default()).unwrap();
        let img = RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]));
        let tensor = preprocessor.preprocess(&img);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_normalization_values() {
        let preprocessor = ImagePreprocessor::new(PreprocessConfig::default()).unwrap();
        let img = RgbImage::from_pixel(256, 256, Rgb([255, 0, 128]));
        let tensor = preprocessor.preprocess(&img);

        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        let blue = (128.0 / 255.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((tensor[[0, 0, 100, 100]] - red).abs() < 1e-4);
        assert!((tensor[[0, 1, 0, 0]] - green).abs() < 1e-4);
        assert!((tensor[[0, 2, 223, 223]] - blue).abs() < 1e-4);
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        // Left and right thirds black, middle white: the crop must be all white.
        let config = PreprocessConfig {
            resize_edge: 4,
            crop_size: 4,
            mean: [0.0; 3],
            std: [1.0; 3],
        };
        let preprocessor = ImagePreprocessor::new(config).unwrap();
        let img = RgbImage::from_fn(12, 4, |x, _| {
            if (4..8).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let tensor = preprocessor.preprocess(&img);
        assert!(tensor.iter().all(|v| (*v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_extreme_aspect_ratio_stays_small() {
        let preprocessor = ImagePreprocessor::new(PreprocessConfig::default()).unwrap();
        // A full resize would be 256 x 16_776_960
        let img = RgbImage::from_pixel(1, 65_535, Rgb([200, 100, 50]));
        let tensor = preprocessor.preprocess(&img);

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        let red = (200.0 / 255.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!(tensor
            .index_axis(ndarray::Axis(1), 0)
            .iter()
            .all(|v| (*v - red).abs() < 1e-4));
    }

    #[test]
    fn test_matches_full_resize_then_crop() {
        let preprocessor = ImagePreprocessor::new(PreprocessConfig::default()).unwrap();
        let img = RgbImage::from_fn(640, 480, |x, y| {
            Rgb([(x * 255 / 639) as u8, (y * 255 / 479) as u8, 128])
        });
        let tensor = preprocessor.preprocess(&img);

        let resized = imageops::resize(&img, 341, 256, FilterType::Triangle);
        let reference = imageops::crop_imm(&resized, 58, 16, 224, 224).to_image();

        for (x, y, pixel) in reference.enumerate_pixels() {
            for c in 0..3 {
                let expected = (pixel[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
                let actual = tensor[[0, c, y as usize, x as usize]];
                assert!(
                    (actual - expected).abs() < 0.05,
                    "channel {} at ({}, {}): {} vs {}",
                    c,
                    x,
                    y,
                    actual,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_axis_window() {
        // No scaling: crop 224 at 16 plus a two pixel border
        let unscaled = AxisWindow::new(16, 224, 256, 256);
        assert_eq!((unscaled.start, unscaled.end), (14, 242));
        assert_eq!((unscaled.scaled_len, unscaled.inner_offset), (228, 2));

        // Single-pixel axis upscaled to 256 is taken whole
        let narrow = AxisWindow::new(16, 224, 1, 256);
        assert_eq!((narrow.start, narrow.end), (0, 1));
        assert_eq!((narrow.scaled_len, narrow.inner_offset), (256, 16));

        // Long axis of a 1 x 65535 image
        let tall = AxisWindow::new(8_388_368, 224, 65_535, 16_776_960);
        assert!(tall.source_len() <= 8);
        assert!(tall.inner_offset + 224 <= tall.scaled_len);
    }

    #[test]
    fn test_prepare_decodes_png() {
        let preprocessor = ImagePreprocessor::new(PreprocessConfig::default()).unwrap();
        let bytes = png_bytes(RgbImage::from_pixel(50, 80, Rgb([1, 2, 3])));
        let tensor = preprocessor.prepare(&bytes).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_invalid_bytes_are_decode_errors() {
        let err = decode_rgb(b"definitely not an image").unwrap_err();
        assert!(matches!(err, VisionError::Decode(_)));
    }

    #[test]
    fn test_rejects_crop_larger_than_resize() {
        let config = PreprocessConfig {
            resize_edge: 200,
            crop_size: 224,
            ..PreprocessConfig::default()
        };
        assert!(matches!(
            ImagePreprocessor::new(config),
            Err(VisionError::InvalidConfig(_))
        ));
    }
}
