//! Shared helpers: home directory lookup, generic JSON merging, dir copies.

pub(crate) mod fs;
pub(crate) mod json;

use std::path::PathBuf;

pub use json::{deep_merge, expand_plugin_root};

pub(crate) fn home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|d| d.home_dir().to_path_buf())
}
