/// Shared data structures for the crop session
///
/// These structs are the values that flow between the queue resolver,
/// the session state machine and the persistence step.

use std::fmt;
use std::path::{Path, PathBuf};

/// One image that still needs cropping
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageRef {
    /// Filename only (e.g., "IMG_0001.jpg"), unique within the input folder
    pub filename: String,
    /// Full path inside the input folder
    pub path: PathBuf,
}

impl ImageRef {
    pub fn new(input_dir: &Path, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        let path = input_dir.join(&filename);
        Self { filename, path }
    }
}

/// Crop rectangle in source-image pixels
///
/// `right` and `bottom` are exclusive, so the width is `right - left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SourceRect {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

impl fmt::Display for SourceRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {}) [{}x{}]",
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width(),
            self.height()
        )
    }
}

/// What the session asks the persistence step to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropRequest {
    pub filename: String,
    pub rect: SourceRect,
}

/// A crop ready to be written: the request, the cropped pixels and where
/// they go. The destination always keeps the input filename.
#[derive(Debug, Clone)]
pub struct CropJob<I> {
    pub request: CropRequest,
    pub image: I,
    pub destination: PathBuf,
}
