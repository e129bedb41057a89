//! Single-plane image filters used by the edge detector.
//!
//! All filters take a row-major 8-bit plane plus its dimensions and return a
//! new plane; none of them mutate their input. Borders are handled by
//! reflect-101 (`gfedcb|abcdefgh|gfedcba`) for convolutions. Every filter is
//! integer or fixed-order float arithmetic, so identical input always yields
//! identical output.

use super::error::PipelineFault;

/// `tan(22.5°)` in Q15 fixed point.
const TG22: i64 = 13_573;
const NMS_SHIFT: u32 = 15;

/// Gaussian weights OpenCV-compatible pipelines use when sigma is derived
/// from small kernel sizes.
const SMALL_GAUSSIAN: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[
        0.031_25, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.031_25,
    ],
];

fn check_len(buf: &[u8], expected: usize) -> Result<(), PipelineFault> {
    if buf.len() != expected {
        return Err(PipelineFault::BufferSize {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Map an out-of-range index back into `0..n` by reflect-101.
fn reflect_101(mut i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let last = n as isize - 1;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

/// BT.601 luma from interleaved RGB, Q14 fixed point.
pub fn luma_from_rgb(rgb: &[u8], width: usize, height: usize) -> Result<Vec<u8>, PipelineFault> {
    check_len(rgb, width * height * 3)?;
    Ok(rgb
        .chunks_exact(3)
        .map(|p| {
            let sum = p[0] as u32 * 4_899 + p[1] as u32 * 9_617 + p[2] as u32 * 1_868;
            ((sum + (1 << 13)) >> 14) as u8
        })
        .collect())
}

/// Replicate a single plane into interleaved 3-channel pixels.
pub fn expand_to_rgb(gray: &[u8]) -> Vec<u8> {
    gray.iter().flat_map(|&v| [v, v, v]).collect()
}

/// 1-D Gaussian weights for an odd `size`.
///
/// A non-positive `sigma` derives it from the size
/// (`0.3 * ((size - 1) * 0.5 - 1) + 0.8`); sizes up to 7 then use the fixed
/// binomial tables.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Result<Vec<f32>, PipelineFault> {
    if size == 0 || size % 2 == 0 {
        return Err(PipelineFault::KernelSize(size));
    }
    if sigma <= 0.0 {
        if let Some(table) = SMALL_GAUSSIAN.get(size / 2) {
            return Ok(table.to_vec());
        }
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size / 2) as f64;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.iter().map(|w| (w / total) as f32).collect())
}

/// Separable Gaussian blur of a single plane.
pub fn gaussian_blur(
    src: &[u8],
    width: usize,
    height: usize,
    size: usize,
    sigma: f64,
) -> Result<Vec<u8>, PipelineFault> {
    check_len(src, width * height)?;
    let kernel = gaussian_kernel(size, sigma)?;
    let radius = (size / 2) as isize;

    let mut horizontal = vec![0f32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - radius, width);
                acc += weight * row[sx] as f32;
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + k as isize - radius, height);
                acc += weight * horizontal[sy * width + x];
            }
            out[y * width + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

/// Row `n - 1` of Pascal's triangle.
fn binomial(n: usize) -> Vec<i32> {
    let mut row = vec![1];
    for _ in 1..n {
        let mut next = vec![1; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

/// Sobel derivative and smoothing kernels for the given aperture.
fn sobel_kernels(aperture: usize) -> Result<(Vec<i32>, Vec<i32>), PipelineFault> {
    if !matches!(aperture, 3 | 5 | 7) {
        return Err(PipelineFault::Aperture(aperture));
    }
    let smooth = binomial(aperture);
    let mut deriv = vec![0; aperture];
    for (i, c) in binomial(aperture - 2).into_iter().enumerate() {
        deriv[i] -= c;
        deriv[i + 2] += c;
    }
    Ok((deriv, smooth))
}

/// Correlate with `kx` along rows, then `ky` along columns.
fn correlate_separable(
    src: &[u8],
    width: usize,
    height: usize,
    kx: &[i32],
    ky: &[i32],
) -> Vec<i32> {
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut horizontal = vec![0i32; width * height];
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            horizontal[y * width + x] = kx
                .iter()
                .enumerate()
                .map(|(k, w)| w * row[reflect_101(x as isize + k as isize - rx, width)] as i32)
                .sum();
        }
    }

    let mut out = vec![0i32; width * height];
    for y in 0..height {
        for x in 0..width {
            out[y * width + x] = ky
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    w * horizontal[reflect_101(y as isize + k as isize - ry, height) * width + x]
                })
                .sum();
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Suppressed,
    Weak,
    Strong,
}

/// Canny edge extraction on a single plane.
///
/// Sobel gradients with the given aperture, L1 magnitude, non-maximum
/// suppression along the quantised gradient direction, then hysteresis:
/// magnitudes above `high` seed edges, magnitudes above `low` survive only
/// when 8-connected to a seed. Output pixels are 0 or 255.
pub fn canny(
    src: &[u8],
    width: usize,
    height: usize,
    low: f64,
    high: f64,
    aperture: usize,
) -> Result<Vec<u8>, PipelineFault> {
    check_len(src, width * height)?;
    let (deriv, smooth) = sobel_kernels(aperture)?;
    let dx = correlate_separable(src, width, height, &deriv, &smooth);
    let dy = correlate_separable(src, width, height, &smooth, &deriv);
    let magnitude: Vec<i64> = dx
        .iter()
        .zip(&dy)
        .map(|(gx, gy)| gx.abs() as i64 + gy.abs() as i64)
        .collect();

    let (w, h) = (width as isize, height as isize);
    let mag_at = |x: isize, y: isize| -> i64 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0
        } else {
            magnitude[(y * w + x) as usize]
        }
    };

    let mut state = vec![EdgeState::Suppressed; width * height];
    let mut seeds = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let m = magnitude[i];
            if (m as f64) <= low {
                continue;
            }

            let gx = dx[i] as i64;
            let gy = dy[i] as i64;
            let xs = gx.abs();
            let ys = gy.abs() << NMS_SHIFT;
            let tg22x = xs * TG22;

            let is_local_max = if ys < tg22x {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else {
                let tg67x = tg22x + (xs << (NMS_SHIFT + 1));
                if ys > tg67x {
                    m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
                } else {
                    let s = if (gx ^ gy) < 0 { -1 } else { 1 };
                    m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
                }
            };
            if !is_local_max {
                continue;
            }

            if (m as f64) > high {
                state[i] = EdgeState::Strong;
                seeds.push(i);
            } else {
                state[i] = EdgeState::Weak;
            }
        }
    }

    while let Some(i) = seeds.pop() {
        let (x, y) = ((i % width) as isize, (i / width) as isize);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let j = (ny * w + nx) as usize;
                if state[j] == EdgeState::Weak {
                    state[j] = EdgeState::Strong;
                    seeds.push(j);
                }
            }
        }
    }

    Ok(state
        .into_iter()
        .map(|s| if s == EdgeState::Strong { 255 } else { 0 })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x8 plane: columns 0..4 = `left`, columns 4..8 = `right` per row.
    fn vertical_step(rows: &[(u8, u8)]) -> Vec<u8> {
        rows.iter()
            .flat_map(|&(left, right)| {
                std::iter::repeat(left)
                    .take(4)
                    .chain(std::iter::repeat(right).take(4))
            })
            .collect()
    }

    fn edge_columns(edges: &[u8], width: usize) -> Vec<usize> {
        let mut cols: Vec<usize> = edges
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 255)
            .map(|(i, _)| i % width)
            .collect();
        cols.sort_unstable();
        cols.dedup();
        cols
    }

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-3, 1), 0);
        assert_eq!(reflect_101(-2, 2), 0);
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let rgb = [255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let gray = luma_from_rgb(&rgb, 4, 1).unwrap();
        assert_eq!(gray, vec![76, 150, 29, 255]);
    }

    #[test]
    fn luma_rejects_wrong_buffer_size() {
        let err = luma_from_rgb(&[0; 5], 2, 1).unwrap_err();
        assert_eq!(
            err,
            PipelineFault::BufferSize {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn expand_to_rgb_replicates_each_value() {
        assert_eq!(expand_to_rgb(&[0, 255]), vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn gaussian_kernel_uses_binomial_table_for_five() {
        let kernel = gaussian_kernel(5, 0.0).unwrap();
        assert_eq!(kernel, vec![0.0625, 0.25, 0.375, 0.25, 0.0625]);
    }

    #[test]
    fn gaussian_kernel_derived_for_large_sizes_is_normalised_and_symmetric() {
        let kernel = gaussian_kernel(9, 0.0).unwrap();
        let total: f32 = kernel.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        for i in 0..4 {
            assert_eq!(kernel[i], kernel[8 - i]);
        }
        assert!(kernel[4] > kernel[3]);
    }

    #[test]
    fn gaussian_kernel_rejects_even_size() {
        assert_eq!(
            gaussian_kernel(4, 0.0).unwrap_err(),
            PipelineFault::KernelSize(4)
        );
        assert_eq!(
            gaussian_kernel(0, 1.0).unwrap_err(),
            PipelineFault::KernelSize(0)
        );
    }

    #[test]
    fn blur_preserves_constant_plane() {
        let plane = vec![100u8; 12 * 10];
        assert_eq!(gaussian_blur(&plane, 12, 10, 5, 0.0).unwrap(), plane);
        assert_eq!(gaussian_blur(&plane, 12, 10, 9, 0.0).unwrap(), plane);
    }

    #[test]
    fn blur_softens_a_single_bright_pixel() {
        let mut plane = vec![0u8; 7 * 7];
        plane[3 * 7 + 3] = 255;
        let blurred = gaussian_blur(&plane, 7, 7, 5, 0.0).unwrap();
        // Centre weight is 0.375^2 of the original
        assert_eq!(blurred[3 * 7 + 3], 36);
        assert!(blurred[3 * 7 + 4] > 0);
        assert_eq!(blurred[0], 0);
    }

    #[test]
    fn sobel_kernels_match_known_apertures() {
        assert_eq!(sobel_kernels(3).unwrap(), (vec![-1, 0, 1], vec![1, 2, 1]));
        assert_eq!(
            sobel_kernels(5).unwrap(),
            (vec![-1, -2, 0, 2, 1], vec![1, 4, 6, 4, 1])
        );
        assert_eq!(
            sobel_kernels(7).unwrap(),
            (
                vec![-1, -4, -5, 0, 5, 4, 1],
                vec![1, 6, 15, 20, 15, 6, 1]
            )
        );
        assert_eq!(sobel_kernels(4).unwrap_err(), PipelineFault::Aperture(4));
    }

    #[test]
    fn canny_finds_nothing_on_flat_plane() {
        let plane = vec![90u8; 16 * 16];
        let edges = canny(&plane, 16, 16, 50.0, 150.0, 3).unwrap();
        assert!(edges.iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_marks_single_column_for_vertical_step() {
        let plane = vertical_step(&[(0, 255); 8]);
        let edges = canny(&plane, 8, 8, 50.0, 150.0, 3).unwrap();
        assert_eq!(edge_columns(&edges, 8), vec![3]);
        for row in 0..8 {
            assert_eq!(edges[row * 8 + 3], 255, "row {row}");
        }
    }

    #[test]
    fn canny_output_is_binary() {
        let plane: Vec<u8> = (0..32 * 32).map(|i| ((i * 37) % 251) as u8).collect();
        let edges = canny(&plane, 32, 32, 50.0, 150.0, 3).unwrap();
        assert!(edges.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn canny_ignores_weak_edges_without_a_strong_seed() {
        // Contrast 30 gives an L1 magnitude of 120: above low, below high
        let plane = vertical_step(&[(0, 30); 8]);
        let edges = canny(&plane, 8, 8, 50.0, 150.0, 3).unwrap();
        assert!(edges.iter().all(|&v| v == 0));
    }

    #[test]
    fn canny_high_threshold_controls_sensitivity() {
        let plane = vertical_step(&[(0, 30); 8]);
        let edges = canny(&plane, 8, 8, 50.0, 100.0, 3).unwrap();
        assert_eq!(edge_columns(&edges, 8), vec![3]);
    }

    #[test]
    fn canny_keeps_weak_edges_connected_to_strong_ones() {
        let mut rows = vec![(0u8, 255u8); 4];
        rows.extend([(0, 30); 4]);
        let plane = vertical_step(&rows);
        let edges = canny(&plane, 8, 8, 50.0, 150.0, 3).unwrap();
        for row in 5..8 {
            assert_eq!(edges[row * 8 + 3], 255, "weak row {row} not linked");
        }
    }

    #[test]
    fn canny_rejects_unsupported_aperture() {
        let plane = vec![0u8; 4];
        assert_eq!(
            canny(&plane, 2, 2, 50.0, 150.0, 9).unwrap_err(),
            PipelineFault::Aperture(9)
        );
    }

    #[test]
    fn canny_handles_tiny_planes() {
        assert_eq!(canny(&[128], 1, 1, 50.0, 150.0, 3).unwrap(), vec![0]);
        assert_eq!(canny(&[0, 255, 0, 255], 2, 2, 50.0, 150.0, 5).unwrap().len(), 4);
    }
}
