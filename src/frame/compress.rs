use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use super::error::EncodeError;
use super::types::CanonicalImage;

/// JPEG quality used when nothing else is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Every JPEG stream starts with SOI followed by a marker prefix.
pub const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Largest side length a baseline JPEG header can describe.
const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Compress an image to JPEG at the given quality (1-100).
///
/// Gray and RGB images are accepted. Empty images, other channel counts and
/// codec failures are returned as errors, never as a partial buffer.
pub fn encode_jpeg(image: &CanonicalImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if image.is_empty() {
        return Err(EncodeError::EmptyImage);
    }
    let color = match image.channels() {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        other => return Err(EncodeError::UnsupportedChannels(other)),
    };
    let (width, height) = (image.width(), image.height());
    if width > MAX_JPEG_DIMENSION || height > MAX_JPEG_DIMENSION {
        return Err(EncodeError::DimensionsTooLarge { width, height });
    }

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode(
        image.as_bytes(),
        width,
        height,
        color,
    )?;
    Ok(buf)
}

/// Compress to JPEG and return the bytes as standard base64.
pub fn encode_base64(image: &CanonicalImage, quality: u8) -> Result<String, EncodeError> {
    let jpeg = encode_jpeg(image, quality)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a synthetic RGB test image (gradient pattern).
    fn make_test_rgb(width: u32, height: u32) -> CanonicalImage {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x % 256) as u8); // R
                data.push((y % 256) as u8); // G
                data.push(128); // B
            }
        }
        CanonicalImage::from_raw(width, height, 3, data).unwrap()
    }

    #[test]
    fn encode_jpeg_produces_magic_header() {
        let jpeg = encode_jpeg(&make_test_rgb(640, 480), DEFAULT_JPEG_QUALITY).unwrap();
        assert!(jpeg.len() > JPEG_MAGIC.len());
        assert_eq!(jpeg[..3], JPEG_MAGIC);
    }

    #[test]
    fn encode_jpeg_accepts_gray_images() {
        let gray = CanonicalImage::from_raw(16, 16, 1, vec![200; 256]).unwrap();
        let jpeg = encode_jpeg(&gray, 80).unwrap();
        assert_eq!(jpeg[..3], JPEG_MAGIC);
    }

    #[test]
    fn encode_jpeg_lower_quality_produces_smaller_output() {
        let image = make_test_rgb(640, 480);
        let high = encode_jpeg(&image, 95).unwrap();
        let low = encode_jpeg(&image, 30).unwrap();
        assert!(
            low.len() < high.len(),
            "quality 30 ({}) should be smaller than quality 95 ({})",
            low.len(),
            high.len()
        );
    }

    #[test]
    fn encode_jpeg_rejects_empty_image() {
        let err = encode_jpeg(&CanonicalImage::empty(3), DEFAULT_JPEG_QUALITY).unwrap_err();
        assert!(matches!(err, EncodeError::EmptyImage));
    }

    #[test]
    fn encode_jpeg_rejects_four_channel_image() {
        let rgba = CanonicalImage::from_raw(2, 2, 4, vec![255; 16]).unwrap();
        let err = encode_jpeg(&rgba, DEFAULT_JPEG_QUALITY).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedChannels(4)));
    }

    #[test]
    fn encode_base64_decodes_back_to_jpeg() {
        let b64 = encode_base64(&make_test_rgb(32, 32), DEFAULT_JPEG_QUALITY).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&b64)
            .unwrap();
        assert_eq!(decoded[..3], JPEG_MAGIC);
    }
}
