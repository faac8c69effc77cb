//! Transports bundled with kiln
//!
//! Each one implements [`FetchStrategy`](crate::FetchStrategy) and is
//! registered by [`FetcherRegistry::builtin`](crate::FetcherRegistry::builtin).

mod copy;
mod git;
mod http;
mod tarball;

pub use copy::CopyStrategy;
pub use git::GitStrategy;
pub use http::HttpClient;
pub use tarball::TarballStrategy;

use kiln_errors::Error;
use kiln_types::{Manifest, MANIFEST_FILE};
use std::path::Path;

/// Read the manifest every populated destination must carry
async fn package_manifest(dest: &Path) -> Result<Manifest, Error> {
    kiln_store::read_manifest(&dest.join(MANIFEST_FILE)).await
}

/// Split `locator#fragment` into its parts
fn split_fragment(source: &str) -> (&str, Option<&str>) {
    match source.split_once('#') {
        Some((base, fragment)) if !fragment.is_empty() => (base, Some(fragment)),
        Some((base, _)) => (base, None),
        None => (source, None),
    }
}

#[cfg(test)]
mod tests {
    use super::split_fragment;

    #[test]
    fn fragments_are_split_once() {
        assert_eq!(
            split_fragment("https://host/repo.git#v1.2"),
            ("https://host/repo.git", Some("v1.2"))
        );
        assert_eq!(split_fragment("repo#"), ("repo", None));
        assert_eq!(split_fragment("plain"), ("plain", None));
    }
}
