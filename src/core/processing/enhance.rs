use image::GrayImage;
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::filter::gaussian_blur_f32;
use ndarray::Array2;
use tracing::debug;

/// Sigma OpenCV picks for a 3x3 Gaussian kernel.
const DENOISE_SIGMA: f32 = 0.8;

/// Contrast Limited Adaptive Histogram Equalization (CLAHE) on an 8-bit grayscale image.
/// - Splits the image into `tiles_x` x `tiles_y` tiles
/// - Builds per-tile histograms with `num_bins` bins
/// - Clips each histogram at `clip_limit` (relative multiplier of average count)
/// - Computes CDFs and performs bilinear interpolation of the CDF value for each pixel
pub fn clahe_equalize(
    gray: &GrayImage,
    tiles_x: usize,
    tiles_y: usize,
    clip_limit: f64,
    num_bins: usize,
) -> GrayImage {
    let cols = gray.width() as usize;
    let rows = gray.height() as usize;
    if rows == 0 || cols == 0 || tiles_x == 0 || tiles_y == 0 || num_bins < 2 {
        return gray.clone();
    }

    let norm = Array2::from_shape_fn((rows, cols), |(r, c)| {
        gray.get_pixel(c as u32, r as u32).0[0] as f64 / 255.0
    });

    let tile_h = rows.div_ceil(tiles_y);
    let tile_w = cols.div_ceil(tiles_x);

    // Precompute per-tile CDFs
    let mut cdfs: Vec<Vec<f64>> = Vec::with_capacity(tiles_x * tiles_y);
    cdfs.resize_with(tiles_x * tiles_y, || vec![0.0; num_bins]);

    for ty in 0..tiles_y {
        let r0 = (ty * tile_h).min(rows);
        let r1 = ((ty + 1) * tile_h).min(rows);
        for tx in 0..tiles_x {
            let c0 = (tx * tile_w).min(cols);
            let c1 = ((tx + 1) * tile_w).min(cols);
            let tile_pixels = ((r1 - r0) * (c1 - c0)) as f64;

            let mut hist = vec![0u32; num_bins];
            for r in r0..r1 {
                for c in c0..c1 {
                    let bin = (norm[(r, c)] * (num_bins as f64 - 1.0)).round() as usize;
                    hist[bin.min(num_bins - 1)] += 1;
                }
            }

            // Clip histogram
            let avg = tile_pixels / num_bins as f64;
            let clip_threshold = (clip_limit * avg).max(1.0);
            let mut excess: f64 = 0.0;
            for h in &mut hist {
                if (*h as f64) > clip_threshold {
                    excess += (*h as f64) - clip_threshold;
                    *h = clip_threshold as u32;
                }
            }
            // Redistribute excess uniformly
            let add_per_bin = (excess / num_bins as f64).floor();
            let mut remainder = (excess - add_per_bin * num_bins as f64).round() as usize;
            for h in &mut hist {
                *h = (*h as f64 + add_per_bin) as u32;
            }
            let mut b = 0;
            while remainder > 0 {
                hist[b] += 1;
                b = (b + 1) % num_bins;
                remainder -= 1;
            }

            let total: f64 = hist.iter().map(|&x| x as f64).sum::<f64>().max(1.0);
            let cdf = &mut cdfs[ty * tiles_x + tx];
            let mut acc = 0.0f64;
            for i in 0..num_bins {
                acc += hist[i] as f64;
                cdf[i] = (acc / total).clamp(0.0, 1.0);
            }
        }
    }

    // Bilinear sample between neighbouring tile CDFs
    let sample_cdf = |r: usize, c: usize, val: f64| -> f64 {
        let rf = r as f64 / tile_h as f64 - 0.5;
        let cf = c as f64 / tile_w as f64 - 0.5;
        let ty = rf.floor().max(0.0) as isize;
        let tx = cf.floor().max(0.0) as isize;
        let dy = (rf - ty as f64).clamp(0.0, 1.0);
        let dx = (cf - tx as f64).clamp(0.0, 1.0);

        let ty0 = ty.clamp(0, tiles_y as isize - 1) as usize;
        let tx0 = tx.clamp(0, tiles_x as isize - 1) as usize;
        let ty1 = (ty + 1).clamp(0, tiles_y as isize - 1) as usize;
        let tx1 = (tx + 1).clamp(0, tiles_x as isize - 1) as usize;

        let bin_pos = (val.clamp(0.0, 1.0) * (num_bins as f64 - 1.0)).round() as usize;

        let cdf00 = cdfs[ty0 * tiles_x + tx0][bin_pos];
        let cdf01 = cdfs[ty0 * tiles_x + tx1][bin_pos];
        let cdf10 = cdfs[ty1 * tiles_x + tx0][bin_pos];
        let cdf11 = cdfs[ty1 * tiles_x + tx1][bin_pos];

        let top = cdf00 * (1.0 - dx) + cdf01 * dx;
        let bottom = cdf10 * (1.0 - dx) + cdf11 * dx;
        top * (1.0 - dy) + bottom * dy
    };

    GrayImage::from_fn(cols as u32, rows as u32, |c, r| {
        let (r, c) = (r as usize, c as usize);
        let v = sample_cdf(r, c, norm[(r, c)]);
        image::Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Contrast-enhanced, denoised and Otsu-binarised view used for the second QR pass.
/// Output pixels are 0 (dark) or 255 (light).
pub fn enhance_for_detection(gray: &GrayImage) -> GrayImage {
    let enhanced = clahe_equalize(gray, 8, 8, 2.0, 256);
    let blurred = gaussian_blur_f32(&enhanced, DENOISE_SIGMA);
    let level = otsu_level(&blurred);
    debug!("Otsu threshold for enhanced view: {}", level);
    threshold(&blurred, level, ThresholdType::Binary)
}
