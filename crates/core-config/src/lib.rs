//! Configuration loading and parsing.
//!
//! Parses `goalmark.toml` (or an override path provided by the binary). Every
//! section and field is optional; unknown fields are ignored so the file can
//! grow without breaking older builds, and a file that fails to parse falls
//! back to defaults with a warning.
//!
//! ```toml
//! [holes]
//! placeholder_width = 2
//!
//! [navigation]
//! cursor_offset = 3
//! wrap = true
//!
//! [prover]
//! source_path = "/tmp/my.agda"
//! ```

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// Widest blank placeholder a hole is padded to.
pub const MAX_PLACEHOLDER_WIDTH: usize = 16;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HolesConfig {
    #[serde(default = "HolesConfig::default_placeholder_width")]
    pub placeholder_width: usize,
}

impl Default for HolesConfig {
    fn default() -> Self {
        Self {
            placeholder_width: Self::default_placeholder_width(),
        }
    }
}

impl HolesConfig {
    const fn default_placeholder_width() -> usize {
        2
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Where the cursor lands inside a hole, counted from its start: 3 puts it
    /// just past `{! `.
    #[serde(default = "NavigationConfig::default_cursor_offset")]
    pub cursor_offset: usize,
    /// Continue at the other end of the buffer when running out of goals.
    #[serde(default = "NavigationConfig::default_wrap")]
    pub wrap: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            cursor_offset: Self::default_cursor_offset(),
            wrap: Self::default_wrap(),
        }
    }
}

impl NavigationConfig {
    const fn default_cursor_offset() -> usize {
        3
    }
    const fn default_wrap() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ProverConfig {
    /// Path the prover knows the document under; embedded in every command.
    #[serde(default = "ProverConfig::default_source_path")]
    pub source_path: String,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            source_path: Self::default_source_path(),
        }
    }
}

impl ProverConfig {
    fn default_source_path() -> String {
        "/tmp/my.agda".to_string()
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub holes: HolesConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub prover: ProverConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub path: Option<PathBuf>,
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("goalmark.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("goalmark").join("goalmark.toml");
    }
    PathBuf::from("goalmark.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let mut cfg = Config {
                raw: Some(content),
                file,
                path: Some(path),
            };
            cfg.clamp();
            Ok(cfg)
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn placeholder_width(&self) -> usize {
        self.file.holes.placeholder_width
    }

    pub fn cursor_offset(&self) -> usize {
        self.file.navigation.cursor_offset
    }

    pub fn wrap_navigation(&self) -> bool {
        self.file.navigation.wrap
    }

    pub fn source_path(&self) -> &str {
        &self.file.prover.source_path
    }

    /// Bring out-of-range values back into range.
    fn clamp(&mut self) {
        let raw = self.file.holes.placeholder_width;
        if raw <= MAX_PLACEHOLDER_WIDTH {
            return;
        }
        self.file.holes.placeholder_width = MAX_PLACEHOLDER_WIDTH;
        info!(
            target: "config",
            raw,
            clamped = MAX_PLACEHOLDER_WIDTH,
            "placeholder_width_clamped"
        );
    }
}
