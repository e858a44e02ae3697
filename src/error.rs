//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, codec, and preset-parsing errors, and provides semantic
//! variants for argument validation and processing failures.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("Preset parse error: {0}")]
    Preset(#[from] serde_json::Error),

    #[error("Resize error: {0}")]
    Resize(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Directory does not exist or is not a directory: {path:?}")]
    InvalidDirectory { path: PathBuf },

    #[error("Image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("No QR code found in {path:?} and redaction is required")]
    RedactionRequired { path: PathBuf },

    #[error("Output already exists: {path:?}")]
    OutputExists { path: PathBuf },

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn resize<E: std::fmt::Display>(e: E) -> Self {
        Error::Resize(e.to_string())
    }
}
