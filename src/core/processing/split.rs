use image::RgbImage;
use image::imageops;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Rect, SplitMode};

/// Tile rectangles for `mode` over a `width x height` image, top-to-bottom or
/// left-to-right.
pub fn split_rects(width: u32, height: u32, mode: SplitMode) -> Result<Vec<Rect>> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    let rects = match mode {
        SplitMode::Squares => {
            let count = height.div_ceil(width);
            (0..count)
                .map(|i| {
                    let top = i * width;
                    let bottom = (top + width).min(height);
                    Rect {
                        x0: 0,
                        y0: top,
                        x1: width - 1,
                        y1: bottom - 1,
                    }
                })
                .collect()
        }
        SplitMode::Columns(parts) => {
            if parts == 0 || parts > width {
                return Err(Error::InvalidArgument {
                    arg: "parts",
                    value: format!("{} for an image {} pixels wide", parts, width),
                });
            }
            let part_w = width / parts;
            (0..parts)
                .map(|i| {
                    let left = i * part_w;
                    let right = if i == parts - 1 { width } else { left + part_w };
                    Rect {
                        x0: left,
                        y0: 0,
                        x1: right - 1,
                        y1: height - 1,
                    }
                })
                .collect()
        }
    };
    Ok(rects)
}

/// Cut `image` into tiles. Tile order matches `split_rects`.
pub fn split_image(image: &RgbImage, mode: SplitMode) -> Result<Vec<RgbImage>> {
    let rects = split_rects(image.width(), image.height(), mode)?;
    debug!("Splitting {}x{} into {} tile(s) ({})", image.width(), image.height(), rects.len(), mode);
    Ok(rects
        .into_iter()
        .map(|r| imageops::crop_imm(image, r.x0, r.y0, r.width(), r.height()).to_image())
        .collect())
}

/// File name of tile `index` (zero based). Square tiles are numbered plainly, columns
/// with two digits.
pub fn tile_file_name(stem: &str, index: usize, mode: SplitMode) -> String {
    match mode {
        SplitMode::Squares => format!("{}_{}.png", stem, index + 1),
        SplitMode::Columns(_) => format!("{}_{:02}.png", stem, index + 1),
    }
}
