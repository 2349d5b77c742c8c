use std::collections::{BTreeSet, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::data::ImageRef;
use crate::error::{CropError, Result};

/// Filename suffixes that count as input images.
///
/// Exact, case-sensitive suffix match: `photo.JPG` is not picked up.
pub const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg"];

/// Check whether a filename is an input image candidate
pub fn is_candidate_image(filename: &str) -> bool {
    IMAGE_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix))
}

/// Ordered snapshot of the images still waiting for a crop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    images: Vec<ImageRef>,
}

impl Queue {
    /// Build a queue, sorting by filename
    pub fn new(mut images: Vec<ImageRef>) -> Self {
        images.sort();
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRef> {
        self.images.get(index)
    }

    /// Drop every entry whose filename is in `names`
    pub fn without(mut self, names: &BTreeSet<String>) -> Self {
        if !names.is_empty() {
            self.images.retain(|image| !names.contains(&image.filename));
        }
        self
    }
}

/// The pair of folders the operator picked.
///
/// Either side may still be missing while the operator is clicking through
/// the folder dialogs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSelection {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl FolderSelection {
    pub fn new(input: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        Self { input, output }
    }

    /// Build a resolver, or `Configuration` if a folder is missing
    pub fn resolver(&self) -> Result<QueueResolver> {
        match (&self.input, &self.output) {
            (Some(input), Some(output)) => QueueResolver::new(input.clone(), output.clone()),
            _ => Err(CropError::Configuration),
        }
    }
}

/// Computes which input images have no counterpart in the output folder.
///
/// Holds nothing but the two paths; every `resolve()` re-reads both folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueResolver {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl QueueResolver {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();

        if input_dir.as_os_str().is_empty() || output_dir.as_os_str().is_empty() {
            return Err(CropError::Configuration);
        }

        Ok(Self { input_dir, output_dir })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Snapshot the queue: input images minus anything already in the output
    /// folder, sorted by filename.
    pub fn resolve(&self) -> Result<Queue> {
        let input_names = list_input_images(&self.input_dir)?;
        let output_names = list_entry_names(&self.output_dir)?;

        let images: Vec<ImageRef> = input_names
            .into_iter()
            .filter(|name| !output_names.contains(OsStr::new(name.as_str())))
            .map(|name| ImageRef::new(&self.input_dir, name))
            .collect();

        log::debug!(
            "Resolved {} pending images ({} -> {})",
            images.len(),
            self.input_dir.display(),
            self.output_dir.display()
        );

        Ok(Queue::new(images))
    }
}

/// Make sure `dir` exists and is a directory before walking it
fn ensure_directory(dir: &Path) -> Result<()> {
    let metadata = fs::metadata(dir).map_err(|e| CropError::directory_access(dir, e))?;
    if !metadata.is_dir() {
        return Err(CropError::directory_access(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    Ok(())
}

/// Walk the top level of `dir`, failing on the first unreadable entry
fn read_top_level(dir: &Path) -> Result<Vec<walkdir::DirEntry>> {
    ensure_directory(dir)?;

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            CropError::directory_access(path, io::Error::from(e))
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Names of regular files in `dir` that look like input images
fn list_input_images(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in read_top_level(dir)? {
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            log::warn!("Skipping non UTF-8 filename: {}", entry.path().display());
            continue;
        };

        if is_candidate_image(name) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

/// Every entry name in `dir`, whatever its kind or extension
fn list_entry_names(dir: &Path) -> Result<HashSet<OsString>> {
    Ok(read_top_level(dir)?
        .into_iter()
        .map(|entry| entry.file_name().to_os_string())
        .collect())
}
