use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{Level, debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use canvasprep::core::processing::blur::MAX_BLUR_REGIONS;
use canvasprep::worker::logging::{CaptureLayer, save_log_entries};
use canvasprep::{
    BatchControl, BatchWorker, CanvasConfig, ListFilter, SplitMode, blur_points_file, detect_file,
    split_directory, split_file,
};

use super::args::{BlurArgs, CanvasArgs, CliArgs, Command, DetectArgs, NormalizeArgs, SplitArgs};
use super::errors::AppError;

const PROGRESS_POLL: Duration = Duration::from_millis(200);

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let capture_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Ignore error if a subscriber is already installed
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(CaptureLayer::new(capture_level))
        .try_init();
}

fn build_config(args: &CanvasArgs) -> Result<CanvasConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => CanvasConfig::from_path(path)?,
        None => CanvasConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
    if args.no_redact {
        config.redact_qr = false;
    }
    Ok(config)
}

pub fn parse_point(s: &str) -> Result<(u32, u32), AppError> {
    let invalid = || AppError::InvalidPoint {
        point: s.to_string(),
    };
    let (x, y) = s.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<u32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<u32>().map_err(|_| invalid())?;
    Ok((x, y))
}

fn run_normalize(args: &NormalizeArgs) -> Result<(), AppError> {
    let mut config = build_config(&args.canvas)?;
    config.require_redaction = args.require_redaction;
    config.allow_upscale = args.allow_upscale;
    config.validate()?;

    if let Some(path) = &args.save_preset {
        config.save_preset(path)?;
    }

    let filter = ListFilter {
        extensions: if args.extensions.is_empty() {
            ListFilter::images().extensions
        } else {
            args.extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect()
        },
        stem: args.stem.clone(),
    };
    debug!("Canvas configuration: {:?}", config);
    debug!("List filter: {:?}", filter);

    let start = Instant::now();
    let mut worker = BatchWorker::spawn(args.input.clone(), config, filter, !args.fail_fast)?;
    let mut last_done = usize::MAX;
    let report = loop {
        if let Some(result) = worker.try_finish() {
            break result?;
        }
        let (done, total) = worker.progress();
        if done != last_done && total > 0 {
            eprintln!("[{}/{}]", done, total);
            last_done = done;
        }
        std::thread::sleep(PROGRESS_POLL);
    };
    info!("Batch completed in {:.2?}", start.elapsed());

    println!(
        "total={} processed={} unchanged={} skipped={} errors={} removed={}",
        report.total,
        report.processed,
        report.unchanged,
        report.skipped,
        report.errors,
        report.removed
    );
    if report.errors > 0 {
        warn!("{} file(s) failed; their sources were kept", report.errors);
    }
    Ok(())
}

fn run_detect(args: &DetectArgs) -> Result<(), AppError> {
    match detect_file(&args.input)? {
        Some(detection) => {
            println!(
                "{} QR code(s) found in {}",
                detection.codes.len(),
                detection.view
            );
            for (i, code) in detection.codes.iter().enumerate() {
                let (x0, y0, x1, y1) = code.quad.bounding_box();
                println!(
                    "  #{} bounds=({},{})-({},{}) payload={}",
                    i + 1,
                    x0,
                    y0,
                    x1,
                    y1,
                    code.content.as_deref().unwrap_or("<undecodable>")
                );
            }
        }
        None => println!("No QR code found"),
    }
    Ok(())
}

fn run_blur(args: &BlurArgs) -> Result<(), AppError> {
    if args.points.len() > MAX_BLUR_REGIONS {
        return Err(AppError::TooManyRegions {
            count: args.points.len(),
            max: MAX_BLUR_REGIONS,
        });
    }
    let points = args
        .points
        .iter()
        .map(|p| parse_point(p))
        .collect::<Result<Vec<_>, _>>()?;

    let config = CanvasConfig {
        jpeg_quality: args.quality,
        ..CanvasConfig::default()
    };
    config.validate()?;
    let output = blur_points_file(&args.input, &points, &config)?;
    println!("{}", output.display());
    Ok(())
}

fn run_split(args: &SplitArgs) -> Result<(), AppError> {
    let mode = match args.parts {
        Some(parts) => SplitMode::Columns(parts),
        None => SplitMode::Squares,
    };
    let config = CanvasConfig {
        redact_qr: !args.no_redact,
        ..CanvasConfig::default()
    };
    if !args.input.is_dir() {
        for output in split_file(&args.input, mode, &config)? {
            println!("{}", output.display());
        }
        return Ok(());
    }

    let mut filter = ListFilter::images();
    if !args.any_stem {
        filter = filter.with_stem(args.stem.as_str());
    }
    debug!("List filter: {:?}", filter);
    let report = split_directory(&args.input, mode, &config, &filter, &BatchControl::default())?;
    println!(
        "total={} split={} tiles={} errors={}",
        report.total, report.split, report.tiles, report.errors
    );
    Ok(())
}

fn save_log(path: &Path) {
    match save_log_entries(path) {
        Ok(count) => info!("Saved {} log entries to {:?}", count, path),
        Err(e) => warn!("Could not save log to {:?}: {}", path, e),
    }
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(args.log);

    let result = match &args.command {
        Command::Normalize(a) => run_normalize(a),
        Command::Detect(a) => run_detect(a),
        Command::Blur(a) => run_blur(a),
        Command::Split(a) => run_split(a),
    };

    if let Some(path) = &args.save_log {
        save_log(path);
    }
    result.map_err(|e| e.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points() {
        assert_eq!(parse_point("10,20").unwrap(), (10, 20));
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), (3, 4));
        assert!(matches!(parse_point("10"), Err(AppError::InvalidPoint { .. })));
        assert!(matches!(parse_point("-1,2"), Err(AppError::InvalidPoint { .. })));
    }

    #[test]
    fn flags_override_preset() {
        let dir = tempfile::tempdir().unwrap();
        let preset = dir.path().join("p.json");
        std::fs::write(&preset, "{ \"width\": 640, \"height\": 480 }").unwrap();
        let args = CanvasArgs {
            config: Some(preset),
            width: Some(1000),
            height: None,
            no_redact: true,
            quality: None,
        };
        let config = build_config(&args).unwrap();
        assert_eq!((config.width, config.height), (1000, 480));
        assert!(!config.redact_qr);
    }
}
