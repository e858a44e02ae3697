use image::RgbImage;
use image::imageops;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::params::CanvasConfig;
use crate::core::processing::padding::pad_onto_canvas;
use crate::core::processing::resize::{calculate_fit_dimensions, resize_rgb_image};
use crate::error::{Error, Result};

/// What the canvas fitter did to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FitReport {
    /// Dimensions as read, before rotation
    pub source: (u32, u32),
    /// Rotated 90 degrees clockwise to portrait
    pub rotated: bool,
    /// Size of the resampled content on the canvas
    pub content: (u32, u32),
    /// Top-left corner of the content on the canvas
    pub offset: (u32, u32),
    pub canvas: (u32, u32),
}

impl FitReport {
    pub fn scaled(&self) -> bool {
        let oriented = if self.rotated {
            (self.source.1, self.source.0)
        } else {
            self.source
        };
        oriented != self.content
    }

    /// False only when the input already was an upright image of exactly the canvas size.
    pub fn changed(&self) -> bool {
        self.rotated || self.source != self.canvas
    }
}

/// Rotate landscape input to portrait, scale it to fit the canvas and centre it on a
/// background-filled canvas of exactly `config.width x config.height`.
pub fn fit_to_canvas(image: RgbImage, config: &CanvasConfig) -> Result<(RgbImage, FitReport)> {
    let source = image.dimensions();
    if source.0 == 0 || source.1 == 0 {
        return Err(Error::EmptyImage {
            width: source.0,
            height: source.1,
        });
    }
    let canvas = (config.width, config.height);

    let rotated = source.1 < source.0;
    let image = if rotated {
        debug!("Rotating {}x{} clockwise to portrait", source.0, source.1);
        imageops::rotate90(&image)
    } else {
        image
    };
    let (cols, rows) = image.dimensions();

    if (cols, rows) == canvas {
        return Ok((
            image,
            FitReport {
                source,
                rotated,
                content: canvas,
                offset: (0, 0),
                canvas,
            },
        ));
    }

    let content = calculate_fit_dimensions(cols, rows, canvas.0, canvas.1, config.allow_upscale);
    info!(
        "Original size: {}x{}, New size: {}x{}",
        cols, rows, content.0, content.1
    );
    let resized = resize_rgb_image(&image, content.0, content.1)?;
    let (out, offset) = pad_onto_canvas(&resized, canvas.0, canvas.1, config.background);

    Ok((
        out,
        FitReport {
            source,
            rotated,
            content,
            offset,
            canvas,
        },
    ))
}
