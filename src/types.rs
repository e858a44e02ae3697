//! Shared types and enums used across canvasprep.
//! Includes the QR detection views (`DetectionView`), the tile splitting modes
//! (`SplitMode`) and the planar geometry (`Point`, `Quad`, `Rect`) passed between
//! the locator and the redactor.
use serde::{Deserialize, Serialize};

/// Derived view of an image that a QR detection pass runs against.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum DetectionView {
    Raw,
    Enhanced,
    Grayscale,
}

impl std::fmt::Display for DetectionView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DetectionView::Raw => "raw image",
            DetectionView::Enhanced => "enhanced image",
            DetectionView::Grayscale => "grayscale image",
        };
        write!(f, "{}", s)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SplitMode {
    /// Square tiles stacked top to bottom; tile height equals image width.
    Squares,
    /// N equal-width columns, the last one absorbing the remainder.
    Columns(u32),
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitMode::Squares => write!(f, "Squares"),
            SplitMode::Columns(n) => write!(f, "Columns({})", n),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Four corners of a located code, in pixel space.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Axis-aligned square quad from the top-left and bottom-right corners.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            points: [
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
        }
    }

    /// (min_x, min_y, max_x, max_y)
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let xs = self.points.iter().map(|p| p.x);
        let ys = self.points.iter().map(|p| p.y);
        (
            xs.clone().min().unwrap_or(0),
            ys.clone().min().unwrap_or(0),
            xs.max().unwrap_or(0),
            ys.max().unwrap_or(0),
        )
    }
}

/// Inclusive pixel rectangle.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})-({},{})", self.x0, self.y0, self.x1, self.y1)
    }
}
