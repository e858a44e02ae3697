use image::RgbImage;
use image::imageops;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info};

use crate::types::{Quad, Rect};

/// Bounding box of `quad` grown by `margin` and clamped to `[0, w-1] x [0, h-1]`.
/// Returns `None` when the box lies completely outside the image.
pub fn expanded_region(quad: &Quad, margin: u32, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (min_x, min_y, max_x, max_y) = quad.bounding_box();
    let margin = margin as i64;
    let x0 = (min_x as i64 - margin).max(0);
    let y0 = (min_y as i64 - margin).max(0);
    let x1 = (max_x as i64 + margin).min(width as i64 - 1);
    let y1 = (max_y as i64 + margin).min(height as i64 - 1);

    if x0 > x1 || y0 > y1 {
        return None;
    }
    Some(Rect {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

/// Blur exactly `rect` of `image` in place.
pub fn blur_region(image: &mut RgbImage, rect: Rect, sigma: f32) {
    let roi = imageops::crop_imm(&*image, rect.x0, rect.y0, rect.width(), rect.height()).to_image();
    let blurred = gaussian_blur_f32(&roi, sigma);
    imageops::replace(image, &blurred, rect.x0 as i64, rect.y0 as i64);
}

/// Blur every located code in place. Returns the rectangles that were blurred;
/// an empty `quads` slice leaves the image untouched.
pub fn redact_quads(image: &mut RgbImage, quads: &[Quad], margin: u32, sigma: f32) -> Vec<Rect> {
    let (width, height) = image.dimensions();
    let mut applied = Vec::with_capacity(quads.len());

    for quad in quads {
        match expanded_region(quad, margin, width, height) {
            Some(rect) => {
                debug!("Blurring region {} (sigma {:.2})", rect, sigma);
                blur_region(image, rect, sigma);
                applied.push(rect);
            }
            None => debug!("Skipping code outside image bounds: {:?}", quad),
        }
    }

    if !applied.is_empty() {
        info!("Redacted {} region(s)", applied.len());
    }
    applied
}
