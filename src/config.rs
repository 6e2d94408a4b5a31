//! Tool configuration.
//!
//! A small settings record loaded from an optional TOML file; command-line
//! flags override individual fields. Unknown keys are rejected so typos in
//! a config file fail loudly instead of being ignored.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::engine::RecognitionParams;
use crate::pipeline::DEFAULT_RASTER_SCALE;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "textlift.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
    /// Recognition language profile.
    pub language: String,
    /// Upscale factor for rendering PDF pages before recognition.
    pub raster_scale: f32,
    /// Recognition engine parameter profile.
    pub recognition: RecognitionParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            raster_scale: DEFAULT_RASTER_SCALE,
            recognition: RecognitionParams::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, from [`DEFAULT_CONFIG_FILE`] in the
    /// working directory when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let candidate = path.map(Path::to_path_buf).or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        });

        match candidate {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)
                    .with_context(|| format!("reading config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("parsing config file {}", p.display()))
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SegmentationMode;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.language, "eng");
        assert_eq!(settings.raster_scale, DEFAULT_RASTER_SCALE);
        assert_eq!(settings.recognition, RecognitionParams::default());
    }

    #[test]
    fn test_parse_toml() {
        let settings: Settings = toml::from_str(
            r#"
            language = "deu"
            raster-scale = 2.0

            [recognition]
            segmentation = "single-block"
            preserve-interword-spaces = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.language, "deu");
        assert_eq!(settings.raster_scale, 2.0);
        assert_eq!(settings.recognition.segmentation, SegmentationMode::SingleBlock);
        assert!(settings.recognition.preserve_interword_spaces);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(toml::from_str::<Settings>("langauge = \"eng\"\n").is_err());
        assert!(toml::from_str::<Settings>("[recognition]\npsm = 6\n").is_err());
    }
}
