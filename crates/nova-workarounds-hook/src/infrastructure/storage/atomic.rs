//! Whole-file replacement that never leaves a half-written target.
//!
//! # How it works (for beginners)
//!
//! Writing straight into `nova.conf` would leave a truncated file behind if
//! the process died halfway.  Instead the new contents go to a temporary
//! file in the *same directory*, which is flushed to disk and then renamed
//! over the target.  On POSIX file systems a rename within one directory is
//! atomic: readers see either the old file or the new one, never a mix.
//!
//! The temporary file takes over the target's permission bits (and, on Unix,
//! its owner and group) before the rename, so a `root:nova 0640` file keeps
//! those attributes after being patched.
//!
//! A symlinked target is resolved first.  The rename then lands on the file
//! the link points to and the link itself stays in place.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::StoreError;

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Temporary sibling path for `path`: `.{file_name}.{uuid}.tmp`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let file_name = format!(".{name}.{}.tmp", Uuid::new_v4().simple());
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

/// The file `path` names after following symlinks, or `path` itself when it
/// does not exist yet.
fn resolve_target(path: &Path) -> Result<PathBuf, StoreError> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Replaces the contents of `path` with `contents`.
///
/// Creates the file if it does not exist.  If `path` is a symlink, the file
/// it points to is replaced and the link is kept.  On failure the temporary
/// file is removed and the target is left as it was.
///
/// # Errors
///
/// Returns [`StoreError::Io`] naming the path that failed.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let target = resolve_target(path)?;
    let tmp = temp_path(&target);
    let result = write_temp(&tmp, &target, contents)
        .and_then(|()| fs::rename(&tmp, &target).map_err(io_error(&target)));

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp) {
            debug!("could not remove temporary file {}: {e}", tmp.display());
        }
        return result;
    }

    sync_parent(&target);
    Ok(())
}

fn write_temp(tmp: &Path, target: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(tmp)
        .map_err(io_error(tmp))?;

    file.write_all(contents).map_err(io_error(tmp))?;
    copy_attributes(target, tmp, &file)?;
    file.sync_all().map_err(io_error(tmp))?;
    Ok(())
}

/// Copies permission bits (and owner/group on Unix) from `target` if it exists.
fn copy_attributes(target: &Path, tmp: &Path, file: &File) -> Result<(), StoreError> {
    let metadata = match fs::metadata(target) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error(target)(e)),
    };

    file.set_permissions(metadata.permissions())
        .map_err(io_error(tmp))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        // Only root may hand a file to another owner; keep going without it.
        if let Err(e) = std::os::unix::fs::fchown(file, Some(metadata.uid()), Some(metadata.gid()))
        {
            warn!(
                "could not copy ownership of {} to the replacement file: {e}",
                target.display()
            );
        }
    }

    Ok(())
}

/// Flushes the directory entry after a rename.  Best effort.
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            debug!("could not sync directory {}: {e}", dir.display());
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nova_atomic_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_replace_file_overwrites_existing_contents() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nova.conf");
        fs::write(&path, "old\n").unwrap();

        // Act
        replace_file(&path, b"new\n").unwrap();

        // Assert
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(leftover_temp_files(&dir), 0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_replace_file_creates_missing_file() {
        let dir = temp_dir();
        let path = dir.join("state.toml");

        replace_file(&path, b"state = \"installed\"\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "state = \"installed\"\n"
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_replace_file_into_missing_directory_fails_cleanly() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("absent").join("nova.conf");

        // Act
        let err = replace_file(&path, b"x").unwrap_err();

        // Assert
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!path.exists());
        assert_eq!(leftover_temp_files(&dir), 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let tmp = temp_path(Path::new("/etc/nova/nova.conf"));
        assert_eq!(tmp.parent(), Some(Path::new("/etc/nova")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".nova.conf."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_temp_path_for_bare_file_name() {
        let tmp = temp_path(Path::new("nova.conf"));
        assert_eq!(tmp.parent(), Some(Path::new("")));
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_file_writes_through_symlink() {
        // Arrange
        let dir = temp_dir();
        let real = dir.join("real.conf");
        let link = dir.join("nova.conf");
        fs::write(&real, "[DEFAULT]\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        // Act
        replace_file(&link, b"[DEFAULT]\n\n[workarounds]\n").unwrap();

        // Assert
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(&real).unwrap(),
            "[DEFAULT]\n\n[workarounds]\n"
        );
        assert_eq!(leftover_temp_files(&dir), 0);
        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_replace_file_keeps_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        // Arrange
        let dir = temp_dir();
        let path = dir.join("nova.conf");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        // Act
        replace_file(&path, b"new\n").unwrap();

        // Assert
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        fs::remove_dir_all(&dir).ok();
    }
}
