//! Synthetic 4:2:0 frames for benchmarks and tests when no camera is attached.

/// Luma of the background.
const BACKGROUND_LUMA: u8 = 32;
/// Luma of the moving square.
const SQUARE_LUMA: u8 = 220;

/// A frame with a bright square on a dark background and neutral chroma.
///
/// `index` shifts the square diagonally so consecutive frames differ. The
/// returned buffer is always `width * height * 3 / 2` bytes.
pub fn test_frame(width: u32, height: u32, index: u64) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut frame = vec![128u8; w * h + w * h / 2];
    frame[..w * h].fill(BACKGROUND_LUMA);

    let side = (w.min(h) / 3).max(1);
    let span_x = w.saturating_sub(side).max(1);
    let span_y = h.saturating_sub(side).max(1);
    let x0 = (index as usize * 4) % span_x;
    let y0 = (index as usize * 3) % span_y;

    for row in y0..(y0 + side).min(h) {
        frame[row * w + x0..row * w + (x0 + side).min(w)].fill(SQUARE_LUMA);
    }
    frame
}
