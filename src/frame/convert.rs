use tracing::trace;

use super::error::DecodeError;
use super::types::{CanonicalImage, ChromaOrder, RawFrame};

/// Decode a 4:2:0 semi-planar camera buffer into a 3-channel RGB image.
///
/// The buffer length must be exactly `width * height * 3 / 2`; anything else
/// is rejected without attempting a partial decode.
pub fn decode(
    buffer: &[u8],
    width: u32,
    height: u32,
    order: ChromaOrder,
) -> Result<CanonicalImage, DecodeError> {
    let frame = RawFrame::new(buffer, width, height, order)?;
    trace!(target: "frame::convert", "Converting {order:?} frame {width}x{height} to RGB");
    let rgb = convert_yuv420sp_to_rgb(
        frame.data(),
        width as usize,
        height as usize,
        frame.order(),
    );
    Ok(CanonicalImage::from_decoded_rgb(width, height, rgb))
}

/// Convert 4:2:0 semi-planar data (NV21 or NV12) to RGB24.
///
/// A full-resolution Y plane is followed by one interleaved chroma plane at
/// half resolution in both dimensions, so each 2x2 block of pixels shares one
/// chroma pair. Uses BT.601 conversion with fixed-point integer arithmetic
/// (<<8). Returns an empty vector for undersized input.
pub fn convert_yuv420sp_to_rgb(
    src: &[u8],
    width: usize,
    height: usize,
    order: ChromaOrder,
) -> Vec<u8> {
    let expected = width * height * 3 / 2;
    if src.len() < expected || width == 0 || height == 0 {
        return Vec::new();
    }

    let y_plane = &src[..width * height];
    let chroma_plane = &src[width * height..];
    let (u_offset, v_offset) = match order {
        ChromaOrder::Vu => (1, 0),
        ChromaOrder::Uv => (0, 1),
    };

    let mut rgb = vec![0u8; width * height * 3];

    for row in 0..height {
        let chroma_row = (row / 2) * width;
        for col in 0..width {
            let y = y_plane[row * width + col] as i32;
            let pair = chroma_row + (col / 2) * 2;
            let u = chroma_plane[pair + u_offset] as i32 - 128;
            let v = chroma_plane[pair + v_offset] as i32 - 128;

            let base = (row * width + col) * 3;
            rgb[base] = ((y * 256 + 359 * v) >> 8).clamp(0, 255) as u8;
            rgb[base + 1] = ((y * 256 - 88 * u - 183 * v) >> 8).clamp(0, 255) as u8;
            rgb[base + 2] = ((y * 256 + 454 * u) >> 8).clamp(0, 255) as u8;
        }
    }

    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_neutral_chroma_to_grey() {
        // 2x2 frame: Y=128 everywhere, one neutral chroma pair
        let frame = vec![128, 128, 128, 128, 128, 128];
        let rgb = convert_yuv420sp_to_rgb(&frame, 2, 2, ChromaOrder::Vu);
        assert_eq!(rgb.len(), 12);
        for pixel in rgb.chunks(3) {
            assert_eq!(pixel, [128, 128, 128]);
        }
    }

    #[test]
    fn nv21_reads_v_before_u() {
        // Y=128, first chroma byte (V) = 200, second (U) = 128
        let frame = vec![128, 128, 128, 128, 200, 128];
        let rgb = convert_yuv420sp_to_rgb(&frame, 2, 2, ChromaOrder::Vu);
        for pixel in rgb.chunks(3) {
            assert_eq!(pixel, [228, 76, 128]);
        }
    }

    #[test]
    fn nv12_reads_u_before_v() {
        // Same bytes, but the first chroma byte is now U
        let frame = vec![128, 128, 128, 128, 200, 128];
        let rgb = convert_yuv420sp_to_rgb(&frame, 2, 2, ChromaOrder::Uv);
        for pixel in rgb.chunks(3) {
            assert_eq!(pixel, [128, 103, 255]);
        }
    }

    #[test]
    fn chroma_pairs_cover_two_by_two_blocks() {
        // 4x2: left block neutral, right block strongly red-shifted (NV21)
        let mut frame = vec![128u8; 8];
        frame.extend_from_slice(&[128, 128, 200, 128]);
        let rgb = convert_yuv420sp_to_rgb(&frame, 4, 2, ChromaOrder::Vu);
        for row in 0..2 {
            let px = |col: usize| &rgb[(row * 4 + col) * 3..(row * 4 + col) * 3 + 3];
            assert_eq!(px(0), [128, 128, 128]);
            assert_eq!(px(1), [128, 128, 128]);
            assert_eq!(px(2), [228, 76, 128]);
            assert_eq!(px(3), [228, 76, 128]);
        }
    }

    #[test]
    fn undersized_buffer_returns_empty() {
        let result = convert_yuv420sp_to_rgb(&[0u8; 5], 2, 2, ChromaOrder::Vu);
        assert!(result.is_empty());
    }

    #[test]
    fn zero_dimensions_return_empty() {
        let result = convert_yuv420sp_to_rgb(&[], 0, 0, ChromaOrder::Uv);
        assert!(result.is_empty());
    }

    #[test]
    fn decode_reports_odd_dimensions_not_a_length_mismatch() {
        // 3x2 at 1.5 bytes per pixel would be 9 bytes, but odd widths have
        // no whole chroma pair.
        let err = decode(&[128u8; 9], 3, 2, ChromaOrder::Vu).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidDimensions {
                width: 3,
                height: 2
            }
        );
    }

    #[test]
    fn decode_fills_every_pixel_of_a_valid_frame() {
        let frame = vec![128u8; 460_800];
        let image = decode(&frame, 640, 480, ChromaOrder::Vu).unwrap();
        assert_eq!((image.width(), image.height()), (640, 480));
        assert_eq!(image.as_bytes().len(), 640 * 480 * 3);
        assert!(image.as_bytes().iter().all(|&b| b == 128));
    }

    #[test]
    fn decode_produces_three_channel_image() {
        let frame = vec![235u8; 6];
        let image = decode(&frame, 2, 2, ChromaOrder::Vu).unwrap();
        assert_eq!(image.channels(), 3);
        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.as_bytes().len(), 12);
    }

    #[test]
    fn decode_rejects_truncated_vga_frame() {
        let frame = vec![0u8; 460_799];
        let err = decode(&frame, 640, 480, ChromaOrder::Vu).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LengthMismatch {
                expected: 460_800,
                actual: 460_799
            }
        ));
    }

    #[test]
    fn decode_rejects_empty_buffer() {
        assert_eq!(
            decode(&[], 640, 480, ChromaOrder::Vu).unwrap_err(),
            DecodeError::Empty
        );
    }
}
