//! QR code location as an ordered list of detection strategies. Each strategy derives
//! its own view of the image; the first view that yields at least one code wins.
use image::{GrayImage, RgbImage};
use rqrr::PreparedImage;
use tracing::{debug, info};

use crate::core::processing::enhance::enhance_for_detection;
use crate::error::{Error, Result};
use crate::types::{DetectionView, Point, Quad};

/// One located code: its corner quad and, when the payload could be read, its text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedCode {
    pub quad: Quad,
    pub content: Option<String>,
}

/// Codes found by the first successful view.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub view: DetectionView,
    pub codes: Vec<LocatedCode>,
}

impl Detection {
    pub fn quads(&self) -> Vec<Quad> {
        self.codes.iter().map(|c| c.quad).collect()
    }
}

pub trait DetectionStrategy: Send + Sync {
    fn view(&self) -> DetectionView;
    fn detect(&self, image: &RgbImage) -> Vec<LocatedCode>;
}

/// Unweighted channel mean, binarised by the detector itself.
pub struct RawStrategy;

/// CLAHE + denoise + Otsu threshold, handed to the detector as a bitmap.
pub struct EnhancedStrategy;

/// Perceptual luma, binarised by the detector itself.
pub struct GrayscaleStrategy;

impl DetectionStrategy for RawStrategy {
    fn view(&self) -> DetectionView {
        DetectionView::Raw
    }

    fn detect(&self, image: &RgbImage) -> Vec<LocatedCode> {
        let mut prepared = PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| {
                let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
                ((r as u16 + g as u16 + b as u16) / 3) as u8
            },
        );
        collect_codes(prepared.detect_grids())
    }
}

impl DetectionStrategy for EnhancedStrategy {
    fn view(&self) -> DetectionView {
        DetectionView::Enhanced
    }

    fn detect(&self, image: &RgbImage) -> Vec<LocatedCode> {
        let gray = image::imageops::grayscale(image);
        let binary = enhance_for_detection(&gray);
        let mut prepared = PreparedImage::prepare_from_bitmap(
            binary.width() as usize,
            binary.height() as usize,
            |x, y| binary.get_pixel(x as u32, y as u32).0[0] == 0,
        );
        collect_codes(prepared.detect_grids())
    }
}

impl DetectionStrategy for GrayscaleStrategy {
    fn view(&self) -> DetectionView {
        DetectionView::Grayscale
    }

    fn detect(&self, image: &RgbImage) -> Vec<LocatedCode> {
        let gray: GrayImage = image::imageops::grayscale(image);
        let mut prepared = PreparedImage::prepare_from_greyscale(
            gray.width() as usize,
            gray.height() as usize,
            |x, y| gray.get_pixel(x as u32, y as u32).0[0],
        );
        collect_codes(prepared.detect_grids())
    }
}

fn collect_codes<G: rqrr::BitGrid>(grids: Vec<rqrr::Grid<G>>) -> Vec<LocatedCode> {
    grids
        .into_iter()
        .map(|grid| {
            let quad = Quad::new(grid.bounds.map(|p| Point::new(p.x, p.y)));
            let content = match grid.decode() {
                Ok((_, content)) => Some(content),
                Err(e) => {
                    debug!("Located grid could not be decoded: {:?}", e);
                    None
                }
            };
            LocatedCode { quad, content }
        })
        .collect()
}

/// Ordered cascade of detection strategies.
pub struct QrLocator {
    strategies: Vec<Box<dyn DetectionStrategy>>,
}

impl Default for QrLocator {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(RawStrategy),
                Box::new(EnhancedStrategy),
                Box::new(GrayscaleStrategy),
            ],
        }
    }
}

impl QrLocator {
    pub fn with_strategies(strategies: Vec<Box<dyn DetectionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn views(&self) -> Vec<DetectionView> {
        self.strategies.iter().map(|s| s.view()).collect()
    }

    /// Run the cascade. `Ok(None)` means no view found a code, which is a normal outcome.
    pub fn locate(&self, image: &RgbImage) -> Result<Option<Detection>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }

        for strategy in &self.strategies {
            let codes = strategy.detect(image);
            debug!("{} view: {} code(s)", strategy.view(), codes.len());
            if !codes.is_empty() {
                info!("QR code located using {}", strategy.view());
                return Ok(Some(Detection {
                    view: strategy.view(),
                    codes,
                }));
            }
        }

        info!("No QR code detected");
        Ok(None)
    }
}
