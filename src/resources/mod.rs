//! Locating asset files on disk.

use std::path::{Path, PathBuf};

/// Directory that asset paths are resolved against.
pub const ASSET_DIR: &str = "assets";

/// Path of `file_name` inside `./assets`, relative to the working directory.
pub fn asset_path(file_name: &str) -> PathBuf {
    Path::new(".").join(ASSET_DIR).join(file_name)
}
