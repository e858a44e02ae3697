#![doc = r#"
canvasprep — QR-code redaction and fixed-canvas normalization for scanned images.

This crate turns a folder of phone scans into uniformly sized, privacy-safe images:
every QR code it can locate is blurred, landscape pages are rotated upright, and the
result is scaled to fit and centred on a fixed canvas (800x800 white by default).
It powers the `canvasprep` CLI and can be embedded in your own Rust applications.

Add dependency
--------------
```toml
[dependencies]
canvasprep = "0.1"
```

Quick start: normalize a folder
-------------------------------
```rust,no_run
use std::path::Path;
use canvasprep::{process_directory, CanvasConfig, ListFilter};

fn main() -> canvasprep::Result<()> {
    let config = CanvasConfig::with_size(800, 800);
    let report = process_directory(Path::new("/scans"), &config, &ListFilter::images())?;
    println!(
        "processed={} unchanged={} skipped={} errors={}",
        report.processed, report.unchanged, report.skipped, report.errors
    );
    Ok(())
}
```

Each processed `photo.jpg` is written next to the source as `photo_800x800.jpg` and the
source is deleted once the new file exists. Files whose name already carries the marker
are left alone, so running the batch twice is harmless.

Process in memory
-----------------
```rust,no_run
use canvasprep::{normalize_image, CanvasConfig};

fn main() -> canvasprep::Result<()> {
    let image = image::open("/scans/page.png")?.to_rgb8();
    let (canvas, outcome) = normalize_image(image, &CanvasConfig::default())?;
    assert_eq!(canvas.dimensions(), (800, 800));
    println!("redacted {} region(s)", outcome.redaction.regions.len());
    Ok(())
}
```

Background batches
------------------
```rust,no_run
use std::path::PathBuf;
use canvasprep::{BatchWorker, CanvasConfig, ListFilter};

fn main() -> canvasprep::Result<()> {
    let worker = BatchWorker::spawn(
        PathBuf::from("/scans"),
        CanvasConfig::default(),
        ListFilter::images(),
        true, // continue_on_error
    )?;
    let (done, total) = worker.progress();
    println!("{done}/{total}");
    let report = worker.join()?;
    println!("removed {} source file(s)", report.removed);
    Ok(())
}
```

Error handling
--------------
All public functions return `canvasprep::Result<T>`; match on `canvasprep::Error` to
handle specific cases.

```rust,no_run
use std::path::Path;
use canvasprep::{detect_file, Error};

fn main() {
    match detect_file(Path::new("/scans/page.jpg")) {
        Ok(Some(detection)) => println!("{} code(s) in {}", detection.codes.len(), detection.view),
        Ok(None) => println!("no QR code"),
        Err(Error::Io(e)) => eprintln!("I/O error: {e}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — configuration and the individual processing stages.
- [`io`] — image decoding, directory listing and encoders.
- [`worker`] — background batch execution and log capture.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;
pub mod worker;

// Curated public API surface
// Types
pub use core::params::CanvasConfig;
pub use core::processing::fit::FitReport;
pub use core::processing::locate::{Detection, LocatedCode, QrLocator};
pub use core::processing::pipeline::{PipelineOutcome, RedactionReport};
pub use error::{Error, Result};
pub use types::{DetectionView, Point, Quad, Rect, SplitMode};

// Listing
pub use io::listing::{ListFilter, list_visible_files};

// High-level API re-exports
pub use api::{
    BatchControl, BatchReport, NormalizeOutcome, SplitReport, blur_points_file, detect_file,
    is_normalized, normalize_file_to_path, normalize_image, normalized_output_path,
    process_directory, process_directory_with, split_directory, split_file,
};
pub use worker::BatchWorker;
