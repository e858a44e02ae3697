//! High-level, ergonomic library API: normalize single images or whole directories,
//! locate QR codes, blur hand-picked regions and split tall scans. Prefer these
//! entrypoints over the low-level processing modules when integrating canvasprep.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::params::CanvasConfig;
use crate::core::processing::blur::{DEFAULT_REGION_SIGMA, DEFAULT_REGION_SIZE, blur_points};
use crate::core::processing::locate::{Detection, QrLocator};
use crate::core::processing::pipeline::{PipelineOutcome, redact_image, run_pipeline};
use crate::core::processing::save::{WriteMode, save_rgb_image, save_rgb_image_with};
use crate::core::processing::split::{split_image, tile_file_name};
use crate::error::{Error, Result};
use crate::io::{ListFilter, list_visible_files, open_rgb};
use crate::types::SplitMode;

fn file_stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sibling(path: &Path, file_name: String) -> PathBuf {
    match path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// True when the file name already carries the size marker of `config`.
pub fn is_normalized(path: &Path, config: &CanvasConfig) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().contains(&config.marker()))
        .unwrap_or(false)
}

/// Sibling output path: the stem with every occurrence of the noise prefix removed,
/// followed by the size marker and the original extension.
pub fn normalized_output_path(path: &Path, config: &CanvasConfig) -> PathBuf {
    let mut stem = file_stem_lossy(path);
    if !config.strip_prefix.is_empty() {
        stem = stem.replace(&config.strip_prefix, "");
    }
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    sibling(path, format!("{}{}{}", stem, config.marker(), ext))
}

/// Redact and fit an in-memory image using the default detection cascade.
pub fn normalize_image(image: RgbImage, config: &CanvasConfig) -> Result<(RgbImage, PipelineOutcome)> {
    config.validate()?;
    run_pipeline(image, &QrLocator::default(), config)
}

/// Result of normalizing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    /// False when the image needed no change and nothing was written
    pub written: bool,
    pub pipeline: PipelineOutcome,
}

/// Normalize `input` into `output`. The input is never removed here.
///
/// An upright image that is already exactly canvas-sized and has no codes to redact
/// is not copied: nothing is written and `written` is false, so the caller keeps the
/// source instead of producing an identical `_WxH` file.
///
/// `output` must not exist yet. An existing file (for example the copy of another
/// source whose name maps to the same output) fails with `Error::OutputExists` and is
/// left untouched.
pub fn normalize_file_to_path(
    input: &Path,
    output: &Path,
    config: &CanvasConfig,
    locator: &QrLocator,
) -> Result<NormalizeOutcome> {
    let image = open_rgb(input)?;
    let (image, pipeline) = run_pipeline(image, locator, config)?;

    if config.redact_qr && config.require_redaction && !pipeline.redaction.found() {
        return Err(Error::RedactionRequired {
            path: input.to_path_buf(),
        });
    }

    let written = pipeline.changed();
    if written {
        save_rgb_image_with(&image, output, config.jpeg_quality, WriteMode::CreateNew)?;
    } else {
        info!("{:?} already matches the canvas, nothing to write", input);
    }
    Ok(NormalizeOutcome {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        written,
        pipeline,
    })
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Files returned by the lister
    pub total: usize,
    /// Normalized copies written
    pub processed: usize,
    /// Already at the canvas size, left as is
    pub unchanged: usize,
    /// Name already carries the size marker
    pub skipped: usize,
    pub errors: usize,
    /// Sources deleted after their normalized copy was written
    pub removed: usize,
    pub cancelled: bool,
}

/// Progress counters and cancellation flag shared between a batch and its observers.
#[derive(Debug, Clone, Default)]
pub struct BatchControl {
    cancel: Arc<AtomicBool>,
    done: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl BatchControl {
    /// Ask the batch to stop; the file in flight is finished first.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// (done, total)
    pub fn progress(&self) -> (usize, usize) {
        (
            self.done.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

/// Normalize every visible file under `input_dir`, continuing past per-file errors.
pub fn process_directory(
    input_dir: &Path,
    config: &CanvasConfig,
    filter: &ListFilter,
) -> Result<BatchReport> {
    process_directory_with(input_dir, config, filter, &BatchControl::default(), true)
}

/// Normalize every visible file under `input_dir`, reporting progress through `control`.
/// If `continue_on_error` is true, errors are counted in the report and processing
/// continues; otherwise, the first error is returned.
pub fn process_directory_with(
    input_dir: &Path,
    config: &CanvasConfig,
    filter: &ListFilter,
    control: &BatchControl,
    continue_on_error: bool,
) -> Result<BatchReport> {
    config.validate()?;
    let files = list_visible_files(input_dir, filter)?;
    let locator = QrLocator::default();

    let mut report = BatchReport {
        total: files.len(),
        ..BatchReport::default()
    };
    control.reset(files.len());
    info!("Processing {} file(s) under {:?}", files.len(), input_dir);

    for path in files {
        if control.is_cancelled() {
            info!("Batch cancelled after {} file(s)", control.progress().0);
            report.cancelled = true;
            break;
        }

        if is_normalized(&path, config) {
            debug!("Skipping already normalized {:?}", path);
            report.skipped += 1;
            control.advance();
            continue;
        }

        let output = normalized_output_path(&path, config);
        match normalize_file_to_path(&path, &output, config, &locator) {
            Ok(outcome) if outcome.written => {
                report.processed += 1;
                match fs::remove_file(&path) {
                    Ok(()) => {
                        report.removed += 1;
                        info!("Removed source {:?}", path);
                    }
                    Err(e) => warn!("Could not remove source {:?}: {}", path, e),
                }
            }
            Ok(_) => report.unchanged += 1,
            Err(e) => {
                report.errors += 1;
                warn!("Failed to process {:?}: {}", path, e);
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
        control.advance();
    }

    info!(
        "Batch finished: {} processed, {} unchanged, {} skipped, {} error(s)",
        report.processed, report.unchanged, report.skipped, report.errors
    );
    Ok(report)
}

/// Run the detection cascade on one file without modifying it.
pub fn detect_file(path: &Path) -> Result<Option<Detection>> {
    let image = open_rgb(path)?;
    QrLocator::default().locate(&image)
}

/// Blur up to three square regions centred on `points` and write
/// `{stem}_blurred_{timestamp}{.ext}` next to `path`. The source is kept.
pub fn blur_points_file(path: &Path, points: &[(u32, u32)], config: &CanvasConfig) -> Result<PathBuf> {
    let image = open_rgb(path)?;
    let (blurred, regions) = blur_points(&image, points, DEFAULT_REGION_SIZE, DEFAULT_REGION_SIGMA)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".png".to_string());
    let output = sibling(path, format!("{}_blurred_{}{}", file_stem_lossy(path), timestamp, ext));

    save_rgb_image(&blurred, &output, config.jpeg_quality)?;
    info!("Blurred {} region(s) of {:?}", regions.len(), path);
    Ok(output)
}

/// Cut `path` into PNG tiles next to it. Square tiles are redacted first when
/// `config.redact_qr` is set.
pub fn split_file(path: &Path, mode: SplitMode, config: &CanvasConfig) -> Result<Vec<PathBuf>> {
    let mut image = open_rgb(path)?;
    if mode == SplitMode::Squares && config.redact_qr {
        let report = redact_image(&mut image, &QrLocator::default(), config)?;
        debug!("Redacted {} region(s) before splitting", report.regions.len());
    }

    let stem = file_stem_lossy(path);
    let tiles = split_image(&image, mode)?;
    let mut outputs = Vec::with_capacity(tiles.len());
    for (i, tile) in tiles.iter().enumerate() {
        let output = sibling(path, tile_file_name(&stem, i, mode));
        save_rgb_image(tile, &output, config.jpeg_quality)?;
        outputs.push(output);
    }
    info!("Split {:?} into {} tile(s)", path, outputs.len());
    Ok(outputs)
}

/// Summary of a directory split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// Files returned by the lister
    pub total: usize,
    /// Files cut into tiles
    pub split: usize,
    /// Tiles written across all files
    pub tiles: usize,
    pub errors: usize,
    pub cancelled: bool,
}

/// Split every file under `input_dir` that passes `filter`, continuing past per-file
/// errors. Sources are kept. Tiles land next to their source, so a filter that would
/// also match earlier tiles (e.g. no stem) picks them up on the next run.
pub fn split_directory(
    input_dir: &Path,
    mode: SplitMode,
    config: &CanvasConfig,
    filter: &ListFilter,
    control: &BatchControl,
) -> Result<SplitReport> {
    if let SplitMode::Columns(0) = mode {
        return Err(Error::InvalidArgument {
            arg: "parts",
            value: "0".to_string(),
        });
    }
    let files = list_visible_files(input_dir, filter)?;
    let mut report = SplitReport {
        total: files.len(),
        ..SplitReport::default()
    };
    control.reset(files.len());
    info!("Splitting {} file(s) under {:?} ({})", files.len(), input_dir, mode);

    for path in files {
        if control.is_cancelled() {
            info!("Split cancelled after {} file(s)", control.progress().0);
            report.cancelled = true;
            break;
        }
        match split_file(&path, mode, config) {
            Ok(outputs) => {
                report.split += 1;
                report.tiles += outputs.len();
            }
            Err(e) => {
                report.errors += 1;
                warn!("Failed to split {:?}: {}", path, e);
            }
        }
        control.advance();
    }

    info!(
        "Split finished: {} file(s), {} tile(s), {} error(s)",
        report.split, report.tiles, report.errors
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_strips_prefix_and_appends_marker() {
        let config = CanvasConfig::default();
        assert_eq!(
            normalized_output_path(Path::new("/scans/扫描全能王 2024-01-02.jpg"), &config),
            PathBuf::from("/scans/2024-01-02_800x800.jpg")
        );
        assert_eq!(
            normalized_output_path(Path::new("plain"), &CanvasConfig::with_size(10, 20)),
            PathBuf::from("plain_10x20")
        );
    }

    #[test]
    fn marker_detection_uses_file_name_only() {
        let config = CanvasConfig::default();
        assert!(is_normalized(Path::new("a/page_800x800.png"), &config));
        assert!(!is_normalized(Path::new("out_800x800/page.png"), &config));
        assert!(!is_normalized(Path::new("page_800x600.png"), &config));
    }

    #[test]
    fn control_reports_progress_and_cancel() {
        let control = BatchControl::default();
        control.reset(4);
        control.advance();
        assert_eq!(control.progress(), (1, 4));
        assert!(!control.is_cancelled());
        control.clone().cancel();
        assert!(control.is_cancelled());
    }
}
