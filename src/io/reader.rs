use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use tracing::debug;

use crate::error::{Error, Result};

/// Decode `path` into an 8-bit RGB buffer, honouring the EXIF orientation tag so that
/// the pixels are upright. The format is sniffed from the content, not the extension.
pub fn open_rgb(path: &Path) -> Result<RgbImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    let rgb = image.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(Error::EmptyImage {
            width: rgb.width(),
            height: rgb.height(),
        });
    }
    debug!(
        "Loaded {:?}: {}x{} ({:?})",
        path,
        rgb.width(),
        rgb.height(),
        orientation
    );
    Ok(rgb)
}
