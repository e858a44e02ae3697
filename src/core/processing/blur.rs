use image::RgbImage;
use image::imageops;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Rect;

/// Most regions a single manual blur pass accepts.
pub const MAX_BLUR_REGIONS: usize = 3;
/// Side of the square blurred around each point.
pub const DEFAULT_REGION_SIZE: u32 = 120;
pub const DEFAULT_REGION_SIGMA: f32 = 10.0;

/// Square of `size` anchored so the point sits at its centre, shifted to stay
/// inside the image at the top-left and truncated at the bottom-right.
pub fn region_around(x: u32, y: u32, size: u32, width: u32, height: u32) -> Option<Rect> {
    let left = x.saturating_sub(size / 2);
    let top = y.saturating_sub(size / 2);
    let right = width.min(left.saturating_add(size));
    let bottom = height.min(top.saturating_add(size));
    if left >= right || top >= bottom {
        return None;
    }
    Some(Rect {
        x0: left,
        y0: top,
        x1: right - 1,
        y1: bottom - 1,
    })
}

/// Blur square regions centred on `points`. Every region is blurred from the
/// unmodified source pixels, so overlapping regions do not compound.
pub fn blur_points(
    image: &RgbImage,
    points: &[(u32, u32)],
    size: u32,
    sigma: f32,
) -> Result<(RgbImage, Vec<Rect>)> {
    if points.len() > MAX_BLUR_REGIONS {
        return Err(Error::InvalidArgument {
            arg: "points",
            value: format!("{} given, at most {}", points.len(), MAX_BLUR_REGIONS),
        });
    }
    if size == 0 {
        return Err(Error::InvalidArgument {
            arg: "region",
            value: size.to_string(),
        });
    }

    let (width, height) = image.dimensions();
    let mut out = image.clone();
    let mut regions = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let Some(rect) = region_around(x, y, size, width, height) else {
            debug!("Point ({}, {}) lies outside the image, ignored", x, y);
            continue;
        };
        let roi = imageops::crop_imm(image, rect.x0, rect.y0, rect.width(), rect.height()).to_image();
        let blurred = gaussian_blur_f32(&roi, sigma);
        imageops::replace(&mut out, &blurred, rect.x0 as i64, rect.y0 as i64);
        regions.push(rect);
    }
    Ok((out, regions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn region_is_centred_and_clamped() {
        assert_eq!(
            region_around(200, 200, 120, 1000, 1000),
            Some(Rect {
                x0: 140,
                y0: 140,
                x1: 259,
                y1: 259
            })
        );
        // near the top-left corner the square is shifted, not shrunk
        assert_eq!(
            region_around(10, 20, 120, 1000, 1000),
            Some(Rect {
                x0: 0,
                y0: 0,
                x1: 119,
                y1: 119
            })
        );
        // near the bottom-right it is truncated
        assert_eq!(
            region_around(990, 990, 120, 1000, 1000),
            Some(Rect {
                x0: 930,
                y0: 930,
                x1: 999,
                y1: 999
            })
        );
        assert_eq!(region_around(2000, 5, 120, 1000, 1000), None);
    }

    #[test]
    fn rejects_more_than_three_points() {
        let image = RgbImage::new(10, 10);
        let points = [(1, 1), (2, 2), (3, 3), (4, 4)];
        assert!(matches!(
            blur_points(&image, &points, 4, 1.0),
            Err(Error::InvalidArgument { arg: "points", .. })
        ));
    }

    #[test]
    fn leaves_pixels_outside_regions() {
        let image = RgbImage::from_fn(300, 300, |x, _| {
            if x % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let (out, regions) = blur_points(&image, &[(100, 100)], 120, 10.0).unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(out.get_pixel(250, 250), image.get_pixel(250, 250));
        assert_ne!(out.get_pixel(100, 100), image.get_pixel(100, 100));
    }
}
