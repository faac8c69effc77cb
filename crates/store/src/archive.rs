//! Tar archive handling for tarball packages

use crate::fs::{create_dir_all, move_contents, remove_dir_all};
use flate2::read::GzDecoder;
use kiln_errors::{Error, PackageError, StorageError};
use std::io::{BufReader, Read};
use std::path::{Component, Path};
use tar::Archive;

/// Scratch directory used inside a destination while extracting
const STAGING_DIR: &str = ".kiln-extract";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extract a `.tar` or `.tar.gz` archive into `dest`
///
/// Compression is detected from the file's leading bytes, not its name.
/// When the archive holds a single top-level directory (the `package/`
/// convention) its contents are moved up so `dest` holds the package root.
///
/// # Errors
///
/// Returns an error if:
/// - The archive cannot be read or is not a tar stream
/// - An entry would escape the destination
/// - I/O operations fail
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<(), Error> {
    let staging = dest.join(STAGING_DIR);
    remove_dir_all(&staging).await?;
    create_dir_all(&staging).await?;

    extract_tar_file(archive, &staging).await?;

    let root = single_top_level_dir(&staging).await?;
    match root {
        Some(inner) => {
            move_contents(&inner, dest).await?;
            remove_dir_all(&staging).await
        }
        None => move_contents(&staging, dest).await,
    }
}

/// Create a tar archive from a directory, gzip-compressed when `gzip` is set
///
/// Entries are stored under a `package/` prefix with deterministic headers.
///
/// # Errors
///
/// Returns an error if the source cannot be walked or the archive cannot be written.
pub async fn create_archive(src: &Path, archive: &Path, gzip: bool) -> Result<(), Error> {
    if let Some(parent) = archive.parent() {
        create_dir_all(parent).await?;
    }

    let src = src.to_path_buf();
    let archive = archive.to_path_buf();

    tokio::task::spawn_blocking(move || {
        use std::fs::File;
        use std::io::{BufWriter, Write};

        let file =
            File::create(&archive).map_err(|e| StorageError::from_io_with_path(&e, &archive))?;
        let writer: Box<dyn Write> = if gzip {
            Box::new(flate2::write::GzEncoder::new(
                BufWriter::new(file),
                flate2::Compression::default(),
            ))
        } else {
            Box::new(BufWriter::new(file))
        };

        let mut builder = tar::Builder::new(writer);
        builder.mode(tar::HeaderMode::Deterministic);
        builder.follow_symlinks(false);
        builder
            .append_dir_all("package", &src)
            .map_err(|e| StorageError::IoError {
                message: e.to_string(),
            })?;
        builder
            .into_inner()
            .and_then(|mut w| w.flush())
            .map_err(|e| StorageError::IoError {
                message: e.to_string(),
            })?;

        Ok::<(), Error>(())
    })
    .await
    .map_err(|e| Error::internal(format!("archive task failed: {e}")))??;

    Ok(())
}

/// Extract a tar archive from a file
async fn extract_tar_file(file_path: &Path, dest: &Path) -> Result<(), Error> {
    let file_path = file_path.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || {
        use std::fs::File;

        let mut file =
            File::open(&file_path).map_err(|e| StorageError::from_io_with_path(&e, &file_path))?;
        let mut magic = [0u8; 2];
        let read = file.read(&mut magic)?;
        let file = File::open(&file_path)?;

        let reader: Box<dyn Read> = if read == 2 && magic == GZIP_MAGIC {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        let mut archive = Archive::new(reader);

        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.set_unpack_xattrs(false);

        let entries = archive.entries().map_err(|e| PackageError::InvalidFormat {
            message: format!("not a tar archive: {e}"),
        })?;
        for entry in entries {
            let mut entry = entry.map_err(|e| PackageError::Corrupted {
                message: e.to_string(),
            })?;

            let path = entry.path()?;
            if path.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            }) {
                return Err(PackageError::InvalidFormat {
                    message: format!("archive contains path traversal: {}", path.display()),
                }
                .into());
            }

            entry.unpack_in(&dest).map_err(|e| PackageError::Corrupted {
                message: e.to_string(),
            })?;
        }

        Ok::<(), Error>(())
    })
    .await
    .map_err(|e| Error::internal(format!("extract task failed: {e}")))??;

    Ok(())
}

/// The only entry of `dir` when that entry is a directory
async fn single_top_level_dir(dir: &Path) -> Result<Option<std::path::PathBuf>, Error> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StorageError::from_io_with_path(&e, dir))?;

    let Some(first) = entries.next_entry().await? else {
        return Ok(None);
    };
    if entries.next_entry().await?.is_some() {
        return Ok(None);
    }

    let path = first.path();
    if first.file_type().await?.is_dir() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio::fs;

    async fn sample_package(dir: &Path) {
        fs::create_dir_all(dir.join("lib")).await.unwrap();
        fs::write(
            dir.join("manifest.toml"),
            "[package]\nname = \"sample\"\nversion = \"1.0.0\"\n",
        )
        .await
        .unwrap();
        fs::write(dir.join("lib/index.js"), b"module.exports = 1;\n")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn gzip_archive_is_unwrapped_into_dest() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let archive = temp.path().join("sample.tgz");
        let dest = temp.path().join("dest");
        sample_package(&src).await;

        create_archive(&src, &archive, true).await.unwrap();
        fs::create_dir_all(&dest).await.unwrap();
        extract_archive(&archive, &dest).await.unwrap();

        assert!(dest.join("manifest.toml").exists());
        assert!(dest.join("lib/index.js").exists());
        assert!(!dest.join("package").exists());
        assert!(!dest.join(STAGING_DIR).exists());
    }

    #[tokio::test]
    async fn plain_tar_is_detected() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let archive = temp.path().join("sample.tar");
        let dest = temp.path().join("dest");
        sample_package(&src).await;

        create_archive(&src, &archive, false).await.unwrap();
        fs::create_dir_all(&dest).await.unwrap();
        extract_archive(&archive, &dest).await.unwrap();

        assert!(dest.join("manifest.toml").exists());
    }

    #[tokio::test]
    async fn garbage_is_rejected() {
        let temp = tempdir().unwrap();
        let archive = temp.path().join("garbage.tgz");
        let dest = temp.path().join("dest");
        fs::write(&archive, vec![0x1f, 0x8b, 0x00, 0x01, 0x02]).await.unwrap();
        fs::create_dir_all(&dest).await.unwrap();

        assert!(extract_archive(&archive, &dest).await.is_err());
    }
}
