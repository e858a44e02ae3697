use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid point: {point}. Expected X,Y with non-negative integers")]
    InvalidPoint { point: String },

    #[error("Too many blur regions: {count}. At most {max} are supported")]
    TooManyRegions { count: usize, max: usize },

    #[error(transparent)]
    Lib(#[from] canvasprep::Error),
}
