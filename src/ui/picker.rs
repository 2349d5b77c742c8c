use std::path::{Path, PathBuf};

use rfd::FileDialog;

/// Something that can ask the operator for a folder
pub trait FolderPicker {
    /// Returns `None` when the operator cancels
    fn pick_folder(&self, title: &str, start: Option<&Path>) -> Option<PathBuf>;
}

/// Native folder dialog
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFolderPicker;

impl FolderPicker for NativeFolderPicker {
    fn pick_folder(&self, title: &str, start: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = FileDialog::new().set_title(title);
        if let Some(dir) = start.filter(|dir| dir.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_folder()
    }
}
