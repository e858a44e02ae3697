use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "canvasprep", version, about = "canvasprep CLI")]
pub struct CliArgs {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    /// Write the captured log to this file when the command finishes
    #[arg(long, global = true)]
    pub save_log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Redact QR codes and fit images onto a fixed canvas, replacing the originals
    Normalize(NormalizeArgs),
    /// Report QR codes found in an image without modifying it
    Detect(DetectArgs),
    /// Blur up to three square regions around the given points
    Blur(BlurArgs),
    /// Split an image, or every matching image under a directory, into square tiles
    /// or equal-width columns
    Split(SplitArgs),
}

#[derive(Args)]
pub struct CanvasArgs {
    /// JSON preset file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Skip QR code detection and redaction
    #[arg(long, default_value_t = false)]
    pub no_redact: bool,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Input directory (processed recursively) or a single image
    pub input: PathBuf,

    #[command(flatten)]
    pub canvas: CanvasArgs,

    /// Treat images without a detectable QR code as failures
    #[arg(long, default_value_t = false)]
    pub require_redaction: bool,

    /// Scale images smaller than the canvas up to fit it
    #[arg(long, default_value_t = false)]
    pub allow_upscale: bool,

    /// Only process files with these extensions (repeatable, case-insensitive)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Only process files with this exact stem (case-insensitive)
    #[arg(long)]
    pub stem: Option<String>,

    /// Stop at the first failing file
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,

    /// Save the effective configuration as a preset file
    #[arg(long)]
    pub save_preset: Option<PathBuf>,
}

#[derive(Args)]
pub struct DetectArgs {
    /// Image to inspect
    pub input: PathBuf,
}

#[derive(Args)]
pub struct BlurArgs {
    /// Image to blur; the source is kept
    pub input: PathBuf,

    /// Region centre as X,Y (repeat up to three times)
    #[arg(short, long = "point", value_name = "X,Y", required = true)]
    pub points: Vec<String>,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 95)]
    pub quality: u8,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Image or directory to split; tiles are written next to each source as PNG
    pub input: PathBuf,

    /// Directory mode: only split files with this stem (case-insensitive)
    #[arg(long, default_value = "xq")]
    pub stem: String,

    /// Directory mode: split every image regardless of its stem
    #[arg(long, default_value_t = false)]
    pub any_stem: bool,

    /// Split into this many equal-width columns instead of square tiles
    #[arg(long)]
    pub parts: Option<u32>,

    /// Skip QR redaction before cutting square tiles
    #[arg(long, default_value_t = false)]
    pub no_redact: bool,
}
