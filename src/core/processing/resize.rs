use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Largest size that keeps the aspect ratio and fits inside `canvas_w x canvas_h`.
/// Dimensions are floored and never drop below 1. With `allow_upscale` false an
/// image that already fits is kept at its own size.
pub fn calculate_fit_dimensions(
    cols: u32,
    rows: u32,
    canvas_w: u32,
    canvas_h: u32,
    allow_upscale: bool,
) -> (u32, u32) {
    if cols == 0 || rows == 0 {
        return (cols, rows);
    }
    if !allow_upscale && cols <= canvas_w && rows <= canvas_h {
        return (cols, rows);
    }

    // Compare W/w against H/h without floating point
    let (w, h, cw, ch) = (cols as u64, rows as u64, canvas_w as u64, canvas_h as u64);
    let (new_w, new_h) = if cw * h <= ch * w {
        (cw, h * cw / w)
    } else {
        (w * ch / h, ch)
    };

    if new_w == 0 || new_h == 0 {
        warn!(
            "Image {}x{} collapses when fitted into {}x{}; clamping to one pixel",
            cols, rows, canvas_w, canvas_h
        );
    }
    (new_w.max(1) as u32, new_h.max(1) as u32)
}

/// Lanczos3 resample of an RGB image.
pub fn resize_rgb_image(image: &RgbImage, target_cols: u32, target_rows: u32) -> Result<RgbImage> {
    if image.dimensions() == (target_cols, target_rows) {
        return Ok(image.clone());
    }
    debug!(
        "Resampling {}x{} -> {}x{}",
        image.width(),
        image.height(),
        target_cols,
        target_rows
    );

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x3,
    )
    .map_err(Error::resize)?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::resize)?;

    RgbImage::from_raw(target_cols, target_rows, dst_image.into_vec())
        .ok_or_else(|| Error::Resize("resized buffer has unexpected length".to_string()))
}
