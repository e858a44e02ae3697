use std::io::Write;

use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::{Error, Result};

/// Encode an RGB image as baseline JPEG. jpeg-encoder addresses dimensions as `u16`.
pub fn write_rgb_jpeg<W: Write>(writer: W, image: &RgbImage, quality: u8) -> Result<()> {
    let (cols, rows) = image.dimensions();
    if cols > u16::MAX as u32 || rows > u16::MAX as u32 {
        return Err(Error::InvalidArgument {
            arg: "jpeg dimensions",
            value: format!("{}x{} exceeds {}", cols, rows, u16::MAX),
        });
    }
    let encoder = Encoder::new(writer, quality);
    encoder.encode(image.as_raw(), cols as u16, rows as u16, ColorType::Rgb)?;
    Ok(())
}
