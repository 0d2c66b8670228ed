//! Image Preprocessor
//!
//! Turns uploaded bytes into the tensor layout the classifier was trained on:
//! grayscale, 100x100, each pixel row scaled to unit L2 norm, NHWC with a
//! batch of one.
//!
//! Grayscale uses the ITU-R 601-2 luma weights in 16-bit fixed point, the
//! same conversion the training images went through. `image`'s own `to_luma8`
//! uses sRGB weights and drifts by a few levels on saturated colors.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb};
use ndarray::{Array4, ArrayView4, Axis};

use crate::constants::{IMAGE_CHANNELS, IMAGE_SIDE};
use super::inference::PredictError;

/// Axis the L2 normalization runs along (width, in NHWC)
pub const NORMALIZATION_AXIS: usize = 2;

/// Preprocessed model input, shape `[1, IMAGE_SIDE, IMAGE_SIDE, IMAGE_CHANNELS]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(Array4<f32>);

impl ImageTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

}

impl From<Array4<f32>> for ImageTensor {
    fn from(array: Array4<f32>) -> Self {
        Self(array)
    }
}

/// Decode, grayscale, resize, normalize and batch an uploaded image
pub fn transform(bytes: &[u8]) -> Result<ImageTensor, PredictError> {
    tracing::debug!(bytes = bytes.len(), "Decoding uploaded image");

    let decoded = image::load_from_memory(bytes)?;
    tracing::debug!(width = decoded.width(), height = decoded.height(), "Image decoded");

    let rgb = decoded.to_rgb8();
    let gray = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| pil_luma(rgb.get_pixel(x, y)));
    let resized = if gray.dimensions() == (IMAGE_SIDE, IMAGE_SIDE) {
        gray
    } else {
        imageops::resize(&gray, IMAGE_SIDE, IMAGE_SIDE, FilterType::CatmullRom)
    };

    let side = IMAGE_SIDE as usize;
    let mut pixels = Array4::<f32>::zeros((1, side, side, IMAGE_CHANNELS));
    for (x, y, pixel) in resized.enumerate_pixels() {
        pixels[[0, y as usize, x as usize, 0]] = f32::from(pixel.0[0]);
    }

    l2_normalize(&mut pixels, Axis(NORMALIZATION_AXIS));
    tracing::debug!(shape = ?pixels.shape(), "Image preprocessed");

    Ok(ImageTensor(pixels))
}

/// L = R * 299/1000 + G * 587/1000 + B * 114/1000, rounded
fn pil_luma(pixel: &Rgb<u8>) -> Luma<u8> {
    let [r, g, b] = pixel.0.map(u32::from);
    Luma([((r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16) as u8])
}

/// Scale every lane along `axis` to unit Euclidean norm. All-zero lanes are left as is.
fn l2_normalize(pixels: &mut Array4<f32>, axis: Axis) {
    for mut lane in pixels.lanes_mut(axis) {
        let norm = lane.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            lane.mapv_inplace(|v| v / norm);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat};
    use std::io::Cursor;

    pub(crate) fn png_bytes<F>(width: u32, height: u32, pixel: F) -> Vec<u8>
    where
        F: Fn(u32, u32) -> Rgb<u8>,
    {
        let img = ImageBuffer::from_fn(width, height, pixel);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_output_shape() {
        let bytes = png_bytes(40, 20, |x, y| Rgb([(x * 5) as u8, (y * 10) as u8, 90]));
        let tensor = transform(&bytes).unwrap();
        assert_eq!(tensor.shape(), &[1, 100, 100, 1]);
    }

    #[test]
    fn test_uniform_image_pins_expected_values() {
        // Every row of a flat image is constant, so each value is 1 / sqrt(100)
        let bytes = png_bytes(64, 64, |_, _| Rgb([128, 128, 128]));
        let tensor = transform(&bytes).unwrap();

        for &v in tensor.view().iter() {
            assert!((v - 0.1).abs() < 1e-5, "expected 0.1, got {}", v);
        }
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(pil_luma(&Rgb([200, 50, 50])), Luma([95]));
        assert_eq!(pil_luma(&Rgb([50, 200, 50])), Luma([138]));
        assert_eq!(pil_luma(&Rgb([255, 255, 255])), Luma([255]));
        assert_eq!(pil_luma(&Rgb([0, 0, 255])), Luma([29]));
    }

    #[test]
    fn test_two_tone_image_pins_expected_values() {
        // Left half luma 95, right half luma 138; no resize at 100x100
        let bytes = png_bytes(100, 100, |x, _| {
            if x < 50 { Rgb([200, 50, 50]) } else { Rgb([50, 200, 50]) }
        });
        let tensor = transform(&bytes).unwrap();

        let norm = (50.0f64 * (95.0 * 95.0 + 138.0 * 138.0)).sqrt();
        let left = (95.0 / norm) as f32;
        let right = (138.0 / norm) as f32;

        for ((_, _, x, _), &v) in tensor.view().indexed_iter() {
            let expected = if x < 50 { left } else { right };
            assert!((v - expected).abs() < 1e-6, "x={} expected {}, got {}", x, expected, v);
        }
        assert!((left - 0.080_190_9).abs() < 1e-6);
        assert!((right - 0.116_487_8).abs() < 1e-6);
    }

    #[test]
    fn test_black_image_stays_zero() {
        let bytes = png_bytes(32, 32, |_, _| Rgb([0, 0, 0]));
        let tensor = transform(&bytes).unwrap();
        assert!(tensor.view().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_rows_have_unit_norm() {
        let bytes = png_bytes(100, 100, |x, y| Rgb([(x + y) as u8, x as u8, y as u8]));
        let tensor = transform(&bytes).unwrap();

        for row in tensor.view().lanes(Axis(NORMALIZATION_AXIS)) {
            let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-4, "row norm {}", norm);
            assert!(row.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_deterministic() {
        let bytes = png_bytes(50, 70, |x, y| Rgb([(x * 3) as u8, (y * 2) as u8, 17]));
        assert_eq!(transform(&bytes).unwrap(), transform(&bytes).unwrap());
    }

    #[test]
    fn test_grayscale_input_accepted() {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(10, 10, Luma([200]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        assert!(transform(out.get_ref()).is_ok());
    }

    #[test]
    fn test_malformed_bytes_rejected() {
        let result = transform(b"definitely not an image");
        assert!(matches!(result, Err(PredictError::Decode(_))));

        assert!(matches!(transform(&[]), Err(PredictError::Decode(_))));
    }
}
