//! Filesystem helpers for plugin and marketplace caches.

use std::path::Path;

/// Recursively copy `src` into `dest`, preserving symlinks as links.
///
/// `dest` is created if missing. Existing files are overwritten.
pub(crate) fn copy_dir_all(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dest.join(entry.file_name());
        if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())?;
            if target.exists() {
                std::fs::remove_file(&target)?;
            }
            #[cfg(unix)]
            std::os::unix::fs::symlink(&link, &target)?;
            #[cfg(not(unix))]
            {
                // Symlinks within plugin bundles degrade to file copies.
                let _ = link;
                std::fs::copy(entry.path(), &target)?;
            }
        } else if file_type.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Replace `dest` with a fresh copy of `src`.
pub(crate) fn replace_dir(src: &Path, dest: &Path) -> std::io::Result<()> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    copy_dir_all(src, dest)
}
