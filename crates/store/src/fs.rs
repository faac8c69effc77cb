//! Filesystem helpers used while populating destinations
//!
//! Removal is idempotent: a missing path is not an error, so the executor
//! can clean up without first checking what a failed strategy left behind.

use kiln_errors::{Error, StorageError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Check whether a path exists
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Create a directory with all parent directories
///
/// # Errors
///
/// Returns an error if permission is denied or any I/O operation fails.
pub async fn create_dir_all(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

/// Remove a directory tree; succeeds if it is already gone
///
/// # Errors
///
/// Returns an error if the tree exists but cannot be removed.
pub async fn remove_dir_all(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io_with_path(&e, path).into()),
    }
}

/// Rename a file or directory
///
/// # Errors
///
/// Returns an error if the rename fails.
pub async fn rename(src: &Path, dst: &Path) -> Result<(), Error> {
    fs::rename(src, dst)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, src).into())
}

/// Recursively copy a directory
///
/// Symlinks are recreated rather than followed.
///
/// # Errors
///
/// Returns an error if reading the source or writing the destination fails.
pub async fn copy_directory(src: &Path, dst: &Path) -> Result<(), Error> {
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        create_dir_all(&to).await?;

        let mut entries = fs::read_dir(&from)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &from))?;
        while let Some(entry) = entries.next_entry().await? {
            let src_path = entry.path();
            let dst_path = to.join(entry.file_name());

            let file_type = entry.file_type().await?;
            if file_type.is_symlink() {
                copy_symlink(&src_path, &dst_path).await?;
            } else if file_type.is_dir() {
                pending.push((src_path, dst_path));
            } else {
                fs::copy(&src_path, &dst_path)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, &src_path))?;
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn copy_symlink(src: &Path, dst: &Path) -> Result<(), Error> {
    let target = fs::read_link(src)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, src))?;
    fs::symlink(&target, dst)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, dst).into())
}

#[cfg(not(unix))]
async fn copy_symlink(src: &Path, dst: &Path) -> Result<(), Error> {
    fs::copy(src, dst)
        .await
        .map(|_| ())
        .map_err(|e| StorageError::from_io_with_path(&e, src).into())
}

/// Move every entry of `from` into `to`, then remove `from`
///
/// # Errors
///
/// Returns an error if listing, renaming or the final removal fails.
pub async fn move_contents(from: &Path, to: &Path) -> Result<(), Error> {
    let mut entries = fs::read_dir(from)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, from))?;
    while let Some(entry) = entries.next_entry().await? {
        rename(&entry.path(), &to.join(entry.file_name())).await?;
    }
    remove_dir_all(from).await
}
