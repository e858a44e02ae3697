use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Noise prefix the CamScanner app puts in front of exported file names.
pub const DEFAULT_STRIP_PREFIX: &str = "扫描全能王 ";

/// Canvas and redaction parameters suitable for preset files and CLI overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Target canvas width in pixels
    pub width: u32,
    /// Target canvas height in pixels
    pub height: u32,
    /// Canvas fill colour around the fitted image
    pub background: [u8; 3],
    /// Locate and blur QR codes before fitting
    pub redact_qr: bool,
    /// Treat "no QR code found" as a per-file failure instead of proceeding unredacted
    pub require_redaction: bool,
    /// Pixels added around each located code before blurring
    pub redact_margin: u32,
    /// Gaussian kernel size (odd) used to blur located codes
    pub blur_kernel: u32,
    /// Removed from output file stems
    pub strip_prefix: String,
    pub jpeg_quality: u8,
    /// If false, images smaller than the canvas are centred at 1x
    pub allow_upscale: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            background: [255, 255, 255],
            redact_qr: true,
            require_redaction: false,
            redact_margin: 5,
            blur_kernel: 31,
            strip_prefix: DEFAULT_STRIP_PREFIX.to_string(),
            jpeg_quality: 95,
            allow_upscale: false,
        }
    }
}

impl CanvasConfig {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// File-name marker for already normalized images, e.g. `_800x800`.
    pub fn marker(&self) -> String {
        format!("_{}x{}", self.width, self.height)
    }

    /// Gaussian sigma for `blur_kernel`, derived the same way OpenCV does for sigma = 0.
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig {
                field: "width/height",
                reason: format!("must be positive, got {}x{}", self.width, self.height),
            });
        }
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(Error::InvalidConfig {
                field: "blur_kernel",
                reason: format!("must be a positive odd number, got {}", self.blur_kernel),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig {
                field: "jpeg_quality",
                reason: format!("must be within 1..=100, got {}", self.jpeg_quality),
            });
        }
        Ok(())
    }

    /// Load a preset file. Anything before the first `{` (e.g. a `//` comment header)
    /// is ignored; missing fields fall back to defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let json_start = content.find('{').ok_or_else(|| Error::InvalidConfig {
            field: "preset",
            reason: format!("no JSON object found in {:?}", path),
        })?;
        let config: CanvasConfig = serde_json::from_str(&content[json_start..])?;
        config.validate()?;
        info!("Preset loaded from: {:?}", path);
        Ok(config)
    }

    pub fn save_preset(&self, path: &Path) -> Result<()> {
        let mut preset_content = String::new();
        preset_content.push_str("// ==========================================\n");
        preset_content.push_str("// canvasprep configuration preset\n");
        preset_content.push_str(&format!("// Version: {}\n", env!("CARGO_PKG_VERSION")));
        preset_content.push_str(&format!(
            "// Generated: {}\n",
            chrono::Utc::now().to_rfc3339()
        ));
        preset_content.push_str("// ==========================================\n\n");
        preset_content.push_str(&serde_json::to_string_pretty(self)?);
        fs::write(path, preset_content)?;
        info!("Preset saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marker_and_sigma() {
        let config = CanvasConfig::default();
        assert_eq!(config.marker(), "_800x800");
        assert!((config.blur_sigma() - 5.0).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_even_kernel_and_zero_size() {
        let mut config = CanvasConfig::default();
        config.blur_kernel = 30;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { field: "blur_kernel", .. })
        ));

        let config = CanvasConfig::with_size(0, 800);
        assert!(config.validate().is_err());
    }

    #[test]
    fn preset_round_trip_keeps_header_and_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let mut config = CanvasConfig::with_size(1000, 1200);
        config.background = [0, 0, 0];
        config.save_preset(&path).unwrap();
        assert_eq!(CanvasConfig::from_path(&path).unwrap(), config);

        let partial = dir.path().join("partial.json");
        fs::write(&partial, "// header\n{ \"width\": 640 }").unwrap();
        let loaded = CanvasConfig::from_path(&partial).unwrap();
        assert_eq!(loaded.width, 640);
        assert_eq!(loaded.height, 800);
        assert_eq!(loaded.strip_prefix, DEFAULT_STRIP_PREFIX);
    }
}
