/// Application configuration
///
/// Settings come from two layers: the JSON file in the user config dir
/// (remembers the last folders between runs) and command line flags, which
/// win over the file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default display box, in logical pixels
pub const DEFAULT_DISPLAY_WIDTH: u32 = 800;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 600;

/// Smallest display box we accept
const MIN_DISPLAY_SIZE: u32 = 64;

/// Command line flags
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "space-cropper", version, about = "Batch-crop a folder of images")]
pub struct Args {
    /// Folder with the images to crop
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Folder the cropped images are written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Width of the display box in pixels
    #[arg(long)]
    pub display_width: Option<u32>,

    /// Height of the display box in pixels
    #[arg(long)]
    pub display_height: Option<u32>,
}

/// Persisted configuration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Width of the box the preview is stretched into
    pub display_width: u32,
    /// Height of the box the preview is stretched into
    pub display_height: u32,
    /// Input folder picked last time
    pub last_input: Option<PathBuf>,
    /// Output folder picked last time
    pub last_output: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_width: DEFAULT_DISPLAY_WIDTH,
            display_height: DEFAULT_DISPLAY_HEIGHT,
            last_input: None,
            last_output: None,
        }
    }
}

impl AppConfig {
    /// Where the config file lives
    /// - Linux: ~/.config/space-cropper/config.json
    /// - macOS: ~/Library/Application Support/space-cropper/config.json
    /// - Windows: %APPDATA%\space-cropper\config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push("space-cropper");
        path.push("config.json");
        Ok(path)
    }

    /// Read the config at `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?.sanitized())
    }

    /// Load from the default location, falling back to defaults on any error
    pub fn load() -> Self {
        match Self::default_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Write the config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Write to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        log::debug!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply command line overrides
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(width) = args.display_width {
            self.display_width = width;
        }
        if let Some(height) = args.display_height {
            self.display_height = height;
        }
        if args.input.is_some() {
            self.last_input = args.input.clone();
        }
        if args.output.is_some() {
            self.last_output = args.output.clone();
        }
        self.sanitized()
    }

    /// Keep the display box at a usable size
    fn sanitized(mut self) -> Self {
        self.display_width = self.display_width.max(MIN_DISPLAY_SIZE);
        self.display_height = self.display_height.max(MIN_DISPLAY_SIZE);
        self
    }
}
