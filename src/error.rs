/// Error types for the crop session
///
/// Every condition here is recoverable: the session is left in a
/// well-defined state and the UI only has to report the message.
/// Sources are wrapped in `Arc` so errors can ride along in iced messages,
/// which must be `Clone`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CropError {
    /// Input or output folder has not been selected yet
    #[error("Please select both input and output folders")]
    Configuration,

    /// A folder is missing or cannot be listed
    #[error("Cannot read directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// The image could not be decoded (corrupt or unsupported)
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Arc<image::ImageError>,
    },

    /// The cropped image could not be written
    #[error("Failed to save {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: Arc<image::ImageError>,
    },

    /// The selection has no area (click without drag)
    #[error("Selection is empty, drag a rectangle to crop")]
    DegenerateCrop,

    /// A save is still in flight
    #[error("Still saving the previous crop")]
    PersistencePending,
}

impl CropError {
    pub fn directory_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DirectoryAccess {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Persistence {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Result type for crop session operations
pub type Result<T> = std::result::Result<T, CropError>;

/// Errors reading or writing the persisted config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
