//! Deterministic hashing of directory trees

use crate::Hash;
use blake3::Hasher;
use kiln_errors::{Error, StorageError};
use std::path::{Path, PathBuf};

/// Hash a directory tree independent of traversal order
///
/// Entries are visited in sorted relative-path order. Each entry feeds its
/// kind, its relative path and its content (file hash or symlink target)
/// into a single BLAKE3 state. Top-level entries named in `exclude` are
/// skipped together with everything below them.
///
/// # Errors
/// Returns an error if the directory cannot be walked or a file cannot be read.
pub async fn hash_directory(root: &Path, exclude: &[&str]) -> Result<Hash, Error> {
    let mut entries = Vec::new();
    collect(root, exclude, &mut entries).await?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Hasher::new();
    for (relative, kind) in entries {
        let full = root.join(&relative);
        let relative = relative.to_string_lossy().replace('\\', "/");
        match kind {
            EntryKind::Dir => {
                hasher.update(b"d\0");
                hasher.update(relative.as_bytes());
                hasher.update(b"\0");
            }
            EntryKind::File => {
                let file_hash = Hash::hash_file(&full).await?;
                hasher.update(b"f\0");
                hasher.update(relative.as_bytes());
                hasher.update(b"\0");
                hasher.update(file_hash.as_bytes());
            }
            EntryKind::Symlink => {
                let target = tokio::fs::read_link(&full)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, &full))?;
                hasher.update(b"l\0");
                hasher.update(relative.as_bytes());
                hasher.update(b"\0");
                hasher.update(target.to_string_lossy().as_bytes());
            }
        }
    }

    Ok(Hash::from_bytes(*hasher.finalize().as_bytes()))
}

#[derive(Debug, Clone, Copy)]
enum EntryKind {
    Dir,
    File,
    Symlink,
}

async fn collect(
    base: &Path,
    exclude: &[&str],
    out: &mut Vec<(PathBuf, EntryKind)>,
) -> Result<(), Error> {
    let mut pending = vec![base.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;

        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if dir == base {
                let name = entry.file_name();
                if exclude.iter().any(|skip| name == *skip) {
                    continue;
                }
            }

            let relative = path
                .strip_prefix(base)
                .map_err(|_| StorageError::InvalidPath {
                    path: path.display().to_string(),
                })?
                .to_path_buf();

            let file_type = entry.file_type().await?;
            if file_type.is_symlink() {
                out.push((relative, EntryKind::Symlink));
            } else if file_type.is_dir() {
                out.push((relative, EntryKind::Dir));
                pending.push(path);
            } else {
                out.push((relative, EntryKind::File));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::fs;

    async fn populate(root: &Path) {
        fs::create_dir_all(root.join("lib")).await.unwrap();
        fs::write(root.join("manifest.toml"), b"[package]\n").await.unwrap();
        fs::write(root.join("lib/index.js"), b"module.exports = 1;\n")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn identical_trees_hash_equal() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        populate(a.path()).await;
        populate(b.path()).await;

        let ha = hash_directory(a.path(), &[]).await.unwrap();
        let hb = hash_directory(b.path(), &[]).await.unwrap();
        assert_eq!(ha, hb);
    }

    #[tokio::test]
    async fn content_change_changes_hash() {
        let dir = tempdir().unwrap();
        populate(dir.path()).await;
        let before = hash_directory(dir.path(), &[]).await.unwrap();

        fs::write(dir.path().join("lib/index.js"), b"module.exports = 2;\n")
            .await
            .unwrap();
        let after = hash_directory(dir.path(), &[]).await.unwrap();
        assert_ne!(before, after);
    }

    #[tokio::test]
    async fn excluded_entries_are_ignored() {
        let dir = tempdir().unwrap();
        populate(dir.path()).await;
        let before = hash_directory(dir.path(), &[".git"]).await.unwrap();

        fs::create_dir_all(dir.path().join(".git")).await.unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref: refs/heads/main\n")
            .await
            .unwrap();
        let after = hash_directory(dir.path(), &[".git"]).await.unwrap();
        assert_eq!(before, after);
    }
}
