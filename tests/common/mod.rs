#![allow(dead_code)]

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use qrcode::QrCode;

pub const MODULE: u32 = 8;
pub const QUIET_ZONE: u32 = 4;

/// Draws `payload` as a QR code onto `image` with its top-left quiet-zone corner at
/// (`left`, `top`). Returns the inclusive pixel bounds of the symbol itself.
pub fn draw_qr(image: &mut RgbImage, payload: &str, left: u32, top: u32) -> (u32, u32, u32, u32) {
    let qr = QrCode::new(payload.as_bytes()).unwrap();
    let width = qr.width() as u32;
    let side = (width + QUIET_ZONE * 2) * MODULE;
    for y in 0..side {
        for x in 0..side {
            image.put_pixel(left + x, top + y, Rgb([255, 255, 255]));
        }
    }
    for y in 0..width {
        for x in 0..width {
            if qr[(x as usize, y as usize)] == qrcode::Color::Dark {
                let px = left + (QUIET_ZONE + x) * MODULE;
                let py = top + (QUIET_ZONE + y) * MODULE;
                for dy in 0..MODULE {
                    for dx in 0..MODULE {
                        image.put_pixel(px + dx, py + dy, Rgb([0, 0, 0]));
                    }
                }
            }
        }
    }
    let x0 = left + QUIET_ZONE * MODULE;
    let y0 = top + QUIET_ZONE * MODULE;
    (x0, y0, x0 + width * MODULE - 1, y0 + width * MODULE - 1)
}

/// Mid-grey gradient so resampling and blurring leave visible traces.
pub fn backdrop(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 200) as u8 + 20, (y % 200) as u8 + 20, 128])
    })
}

pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}
