use image::RgbImage;
use serde::Serialize;
use tracing::info;

use crate::core::params::CanvasConfig;
use crate::core::processing::fit::{FitReport, fit_to_canvas};
use crate::core::processing::locate::QrLocator;
use crate::core::processing::redact::redact_quads;
use crate::error::Result;
use crate::types::{DetectionView, Rect};

/// Redaction half of the pipeline outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedactionReport {
    /// View that located the codes, if any did
    pub view: Option<DetectionView>,
    pub regions: Vec<Rect>,
    /// Decoded payloads, kept for logging only
    pub payloads: Vec<String>,
}

impl RedactionReport {
    pub fn found(&self) -> bool {
        !self.regions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub redaction: RedactionReport,
    pub fit: FitReport,
}

impl PipelineOutcome {
    pub fn changed(&self) -> bool {
        self.redaction.found() || self.fit.changed()
    }
}

/// Locate and blur QR codes in place.
pub fn redact_image(
    image: &mut RgbImage,
    locator: &QrLocator,
    config: &CanvasConfig,
) -> Result<RedactionReport> {
    let Some(detection) = locator.locate(image)? else {
        return Ok(RedactionReport::default());
    };
    let regions = redact_quads(
        image,
        &detection.quads(),
        config.redact_margin,
        config.blur_sigma(),
    );
    let payloads = detection
        .codes
        .into_iter()
        .filter_map(|c| c.content)
        .collect();
    Ok(RedactionReport {
        view: Some(detection.view),
        regions,
        payloads,
    })
}

/// Full in-memory normalization: optional QR redaction, then canvas fitting.
pub fn run_pipeline(
    mut image: RgbImage,
    locator: &QrLocator,
    config: &CanvasConfig,
) -> Result<(RgbImage, PipelineOutcome)> {
    let redaction = if config.redact_qr {
        let report = redact_image(&mut image, locator, config)?;
        if !report.found() {
            info!("No QR code found; continuing without redaction");
        }
        report
    } else {
        RedactionReport::default()
    };

    let (image, fit) = fit_to_canvas(image, config)?;
    info!(
        "Normalized {}x{} -> {}x{} (rotated: {}, redacted: {})",
        fit.source.0,
        fit.source.1,
        fit.canvas.0,
        fit.canvas.1,
        fit.rotated,
        redaction.regions.len()
    );
    Ok((image, PipelineOutcome { redaction, fit }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processing::locate::{DetectionStrategy, LocatedCode};
    use crate::types::Quad;
    use image::Rgb;

    struct Always;

    impl DetectionStrategy for Always {
        fn view(&self) -> DetectionView {
            DetectionView::Grayscale
        }

        fn detect(&self, _image: &RgbImage) -> Vec<LocatedCode> {
            vec![LocatedCode {
                quad: Quad::from_corners(10, 10, 30, 30),
                content: Some("hello".to_string()),
            }]
        }
    }

    #[test]
    fn redaction_then_fit() {
        let image = RgbImage::from_fn(100, 100, |x, _| {
            if x % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let locator = QrLocator::with_strategies(vec![Box::new(Always)]);
        let config = CanvasConfig::with_size(100, 100);
        let (out, outcome) = run_pipeline(image.clone(), &locator, &config).unwrap();

        assert_eq!(outcome.redaction.view, Some(DetectionView::Grayscale));
        assert_eq!(
            outcome.redaction.regions,
            vec![Rect {
                x0: 5,
                y0: 5,
                x1: 35,
                y1: 35
            }]
        );
        assert_eq!(outcome.redaction.payloads, vec!["hello".to_string()]);
        assert!(!outcome.fit.changed());
        assert!(outcome.changed());
        assert_ne!(out.get_pixel(20, 20), image.get_pixel(20, 20));
        assert_eq!(out.get_pixel(80, 80), image.get_pixel(80, 80));
    }

    #[test]
    fn redaction_disabled_skips_locator() {
        let image = RgbImage::from_pixel(100, 100, Rgb([1, 2, 3]));
        let locator = QrLocator::with_strategies(vec![Box::new(Always)]);
        let mut config = CanvasConfig::with_size(100, 100);
        config.redact_qr = false;
        let (out, outcome) = run_pipeline(image.clone(), &locator, &config).unwrap();
        assert!(!outcome.changed());
        assert_eq!(out, image);
    }
}
