mod common;

use std::fs;

use canvasprep::{
    BatchControl, CanvasConfig, Error, ListFilter, SplitMode, blur_points_file, split_directory,
    split_file,
};
use common::{backdrop, write_png};

#[test]
fn square_split_names_and_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "long.png", &backdrop(50, 120));
    let config = CanvasConfig {
        redact_qr: false,
        ..CanvasConfig::default()
    };

    let outputs = split_file(&path, SplitMode::Squares, &config).unwrap();
    let names: Vec<_> = outputs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["long_1.png", "long_2.png", "long_3.png"]);
    let last = image::open(&outputs[2]).unwrap();
    assert_eq!((last.width(), last.height()), (50, 20));
    assert!(path.exists());
}

#[test]
fn column_split_names_and_remainder() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "wide.png", &backdrop(100, 30));

    let outputs = split_file(&path, SplitMode::Columns(3), &CanvasConfig::default()).unwrap();
    assert_eq!(outputs.len(), 3);
    assert!(outputs[0].ends_with("wide_01.png"));
    assert!(outputs[2].ends_with("wide_03.png"));
    assert_eq!(image::open(&outputs[2]).unwrap().width(), 34);

    assert!(matches!(
        split_file(&path, SplitMode::Columns(0), &CanvasConfig::default()),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn manual_blur_writes_timestamped_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_png(dir.path(), "card.png", &backdrop(300, 300));

    let output = blur_points_file(&path, &[(150, 150)], &CanvasConfig::default()).unwrap();
    let name = output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("card_blurred_"));
    assert!(name.ends_with(".png"));
    // card_blurred_YYYYmmdd_HHMMSS.png
    assert_eq!(name.len(), "card_blurred_".len() + 15 + ".png".len());
    assert!(path.exists());

    let too_many = [(1, 1), (2, 2), (3, 3), (4, 4)];
    assert!(blur_points_file(&path, &too_many, &CanvasConfig::default()).is_err());
}

#[test]
fn directory_split_follows_stem_filter_and_isolates_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "xq.png", &backdrop(40, 10));
    fs::create_dir_all(dir.path().join("b")).unwrap();
    write_png(&dir.path().join("b"), "XQ.png", &backdrop(60, 10));
    fs::create_dir_all(dir.path().join("c")).unwrap();
    fs::write(dir.path().join("c").join("xq.jpg"), b"not a jpeg").unwrap();
    let other = write_png(dir.path(), "other.png", &backdrop(40, 10));

    let filter = ListFilter::images().with_stem("xq");
    let report = split_directory(
        dir.path(),
        SplitMode::Columns(2),
        &CanvasConfig::default(),
        &filter,
        &BatchControl::default(),
    )
    .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.split, 2);
    assert_eq!(report.tiles, 4);
    assert_eq!(report.errors, 1);
    assert!(!report.cancelled);

    assert!(dir.path().join("xq_01.png").exists());
    assert!(dir.path().join("b").join("XQ_02.png").exists());
    assert!(other.exists());
    assert!(!dir.path().join("other_01.png").exists());
}

#[test]
fn cancelled_directory_split_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "xq.png", &backdrop(20, 50));

    let control = BatchControl::default();
    control.cancel();
    let report = split_directory(
        dir.path(),
        SplitMode::Squares,
        &CanvasConfig::default(),
        &ListFilter::images().with_stem("xq"),
        &control,
    )
    .unwrap();
    assert!(report.cancelled);
    assert_eq!(report.split, 0);
    assert!(!dir.path().join("xq_1.png").exists());
}
