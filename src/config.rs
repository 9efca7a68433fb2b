//! Conversion options, loadable from JSON.
//!
//! ```json
//! { "decode-mode": "ldr", "swizzle": "bgra", "flip-y": false }
//! ```
//!
//! Missing keys take their defaults, which reproduce the stock conversion:
//! sRGB decode, identity swizzle, slice 0 flipped vertically, no debug dump.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::decoder::DecodeMode;
use crate::image::Swizzle;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Invalid config {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConvertOptions {
    pub decode_mode:  DecodeMode,
    pub swizzle:      Swizzle,
    /// Store rows bottom-up in the exported image.
    pub flip_y:       bool,
    /// Z slice of a volume texture to export.
    pub slice:        u32,
    /// Also write the encoded PNG here.
    pub debug_output: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            decode_mode:  DecodeMode::LdrSrgb,
            swizzle:      Swizzle::RGBA,
            flip_y:       true,
            slice:        0,
            debug_output: None,
        }
    }
}

impl ConvertOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let options = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;
        log::debug!("loaded conversion options from {}", path.display());
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let opts: ConvertOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, ConvertOptions::default());
        assert!(opts.flip_y);
        assert_eq!(opts.decode_mode, DecodeMode::LdrSrgb);
    }

    #[test]
    fn kebab_case_keys() {
        let opts: ConvertOptions = serde_json::from_str(
            r#"{ "decode-mode": "ldr", "swizzle": "bgra", "flip-y": false, "slice": 2, "debug-output": "out.png" }"#,
        )
        .unwrap();
        assert_eq!(opts.decode_mode, DecodeMode::Ldr);
        assert_eq!(opts.swizzle.to_string(), "bgra");
        assert!(!opts.flip_y);
        assert_eq!(opts.slice, 2);
        assert_eq!(opts.debug_output, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(serde_json::from_str::<ConvertOptions>(r#"{ "flipy": true }"#).is_err());
        assert!(serde_json::from_str::<ConvertOptions>(r#"{ "swizzle": "xyzw" }"#).is_err());
        assert!(serde_json::from_str::<ConvertOptions>(r#"{ "decode-mode": "hdr" }"#).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ConvertOptions::from_json_file("/nonexistent/astc-png.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
