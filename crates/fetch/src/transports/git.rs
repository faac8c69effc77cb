//! Packages cloned from git repositories

use super::{package_manifest, split_fragment};
use crate::strategy::{FetchRequest, FetchStrategy};
use async_trait::async_trait;
use kiln_errors::{Error, NetworkError};
use kiln_types::FetchedMetadata;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Clones `<url>[#<ref>]` and pins the checked-out commit
///
/// A `resolved` locator from a previous fetch takes precedence over the ref
/// in `source`, so lockfile installs are reproducible. The `.git` directory
/// is removed once the commit id is known.
pub struct GitStrategy {
    request: FetchRequest,
}

impl GitStrategy {
    #[must_use]
    pub fn new(request: FetchRequest) -> Self {
        Self { request }
    }

    async fn git(args: &[&str], cwd: Option<&Path>) -> Result<String, Error> {
        let mut command = Command::new("git");
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| NetworkError::DownloadFailed(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NetworkError::DownloadFailed(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            ))
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl FetchStrategy for GitStrategy {
    async fn fetch(&mut self) -> Result<FetchedMetadata, Error> {
        let dest = self.request.dest.clone();
        let dest_str = dest.to_string_lossy().into_owned();
        let (url, reference) = split_fragment(&self.request.remote.source);
        let pinned = self
            .request
            .remote
            .resolved
            .as_deref()
            .and_then(|resolved| split_fragment(resolved).1);

        match (pinned, reference) {
            (Some(commit), _) => {
                Self::git(&["clone", "--quiet", url, &dest_str], None).await?;
                Self::git(&["checkout", "--quiet", commit], Some(&dest)).await?;
            }
            (None, Some(branch)) => {
                Self::git(
                    &["clone", "--quiet", "--depth", "1", "--branch", branch, url, &dest_str],
                    None,
                )
                .await?;
            }
            (None, None) => {
                Self::git(&["clone", "--quiet", "--depth", "1", url, &dest_str], None).await?;
            }
        }

        let commit = Self::git(&["rev-parse", "HEAD"], Some(&dest)).await?;
        kiln_store::fs::remove_dir_all(&dest.join(".git")).await?;

        let manifest = package_manifest(&dest).await?;
        let resolved = format!("{url}#{commit}");
        Ok(FetchedMetadata::fetched(manifest, Some(resolved), commit, dest))
    }
}
