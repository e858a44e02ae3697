use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use image::{ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::writers::jpeg::write_rgb_jpeg;

/// Output encoding chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Other(ImageFormat),
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::InvalidArgument {
                arg: "output",
                value: format!("{:?} has no extension", path),
            })?;
        match ImageFormat::from_extension(ext) {
            Some(ImageFormat::Jpeg) => Ok(OutputFormat::Jpeg),
            Some(format) if format.writing_enabled() => Ok(OutputFormat::Other(format)),
            _ => Err(Error::InvalidArgument {
                arg: "output",
                value: format!("unsupported image extension .{}", ext),
            }),
        }
    }
}

/// What to do when the output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    /// Fail with `Error::OutputExists` and leave the existing file alone
    CreateNew,
}

/// Encode `image` into `output`, replacing any existing file.
pub fn save_rgb_image(image: &RgbImage, output: &Path, jpeg_quality: u8) -> Result<()> {
    save_rgb_image_with(image, output, jpeg_quality, WriteMode::Replace)
}

/// Encode `image` into `output`, picking the codec from the extension. The data is
/// written to a temporary file next to `output` and moved into place once complete,
/// so a failed write never leaves a truncated file behind.
pub fn save_rgb_image_with(
    image: &RgbImage,
    output: &Path,
    jpeg_quality: u8,
    mode: WriteMode,
) -> Result<()> {
    let format = OutputFormat::from_path(output)?;
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp = tempfile::Builder::new()
        .prefix(".canvasprep-")
        .suffix(".part")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        match format {
            OutputFormat::Jpeg => write_rgb_jpeg(&mut writer, image, jpeg_quality)?,
            OutputFormat::Other(format) => {
                image.write_to(&mut writer, format)?;
            }
        }
        writer.flush()?;
    }
    debug!("Encoded {:?} as {:?}", output, format);

    let persisted = match mode {
        WriteMode::Replace => tmp.persist(output),
        WriteMode::CreateNew => tmp.persist_noclobber(output),
    };
    persisted.map_err(|e| match e.error.kind() {
        ErrorKind::AlreadyExists => Error::OutputExists {
            path: output.to_path_buf(),
        },
        _ => Error::Io(e.error),
    })?;
    info!("Saved {:?}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("a/b.JPG")).unwrap(),
            OutputFormat::Jpeg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("b.png")).unwrap(),
            OutputFormat::Other(ImageFormat::Png)
        );
        assert!(OutputFormat::from_path(Path::new("b")).is_err());
        assert!(OutputFormat::from_path(Path::new("b.txt")).is_err());
    }

    #[test]
    fn saves_png_and_jpeg_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbImage::from_pixel(20, 10, Rgb([1, 2, 3]));

        let png = dir.path().join("out.png");
        save_rgb_image(&image, &png, 95).unwrap();
        assert_eq!(image::open(&png).unwrap().to_rgb8(), image);

        let jpg = dir.path().join("out.jpg");
        save_rgb_image(&image, &jpg, 95).unwrap();
        assert_eq!(image::open(&jpg).unwrap().width(), 20);

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn create_new_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.png");
        let first = RgbImage::from_pixel(4, 4, Rgb([10, 10, 10]));
        save_rgb_image_with(&first, &path, 95, WriteMode::CreateNew).unwrap();

        let second = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        assert!(matches!(
            save_rgb_image_with(&second, &path, 95, WriteMode::CreateNew),
            Err(Error::OutputExists { .. })
        ));
        assert_eq!(image::open(&path).unwrap().to_rgb8(), first);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        save_rgb_image(&second, &path, 95).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), second);
    }
}
