//! Transport tag to strategy lookup

use crate::strategy::{FetchRequest, FetchStrategy, StrategyConstructor};
use crate::transports::{CopyStrategy, GitStrategy, TarballStrategy};
use kiln_errors::FetchError;
use kiln_types::Transport;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Maps transport tags to strategy constructors
///
/// Filled before a run starts and shared read-only (behind an `Arc`) by
/// every fetch task afterwards.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    constructors: HashMap<String, StrategyConstructor>,
}

impl FetcherRegistry {
    /// An empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the bundled `tarball`, `git` and `copy` transports
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Transport::TARBALL, |request| -> Box<dyn FetchStrategy> {
            Box::new(TarballStrategy::new(request))
        });
        registry.register(Transport::GIT, |request| -> Box<dyn FetchStrategy> {
            Box::new(GitStrategy::new(request))
        });
        registry.register(Transport::COPY, |request| -> Box<dyn FetchStrategy> {
            Box::new(CopyStrategy::new(request))
        });
        registry
    }

    /// Add or replace the constructor for a transport tag
    pub fn register<F>(&mut self, tag: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(FetchRequest) -> Box<dyn FetchStrategy> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Arc::new(constructor));
        self
    }

    /// Constructor for `transport`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::UnknownTransport` naming `package` when no
    /// strategy is registered for the tag.
    pub fn lookup(
        &self,
        transport: &Transport,
        package: &str,
    ) -> Result<StrategyConstructor, FetchError> {
        self.constructors
            .get(transport.as_str())
            .cloned()
            .ok_or_else(|| FetchError::UnknownTransport {
                package: package.to_string(),
                transport: transport.to_string(),
            })
    }

    #[must_use]
    pub fn supports(&self, transport: &Transport) -> bool {
        self.constructors.contains_key(transport.as_str())
    }

    /// Registered tags, sorted
    #[must_use]
    pub fn transports(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("transports", &self.transports())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_knows_bundled_transports() {
        let registry = FetcherRegistry::builtin();
        assert_eq!(registry.transports(), vec!["copy", "git", "tarball"]);
        assert!(registry.supports(&Transport::git()));
    }

    #[test]
    fn unknown_tag_is_typed_error() {
        let registry = FetcherRegistry::builtin();
        let Err(err) = registry.lookup(&Transport::new("svn"), "c") else {
            panic!("svn should not be registered");
        };
        assert!(matches!(
            &err,
            FetchError::UnknownTransport { package, transport }
                if package == "c" && transport == "svn"
        ));
        assert!(err.to_string().contains("unknown fetcher for svn"));
    }

    #[test]
    fn register_extends_registry() {
        let mut registry = FetcherRegistry::new();
        assert!(!registry.supports(&Transport::copy()));
        registry.register("copy", |request| -> Box<dyn FetchStrategy> {
            Box::new(CopyStrategy::new(request))
        });
        assert!(registry.lookup(&Transport::copy(), "a").is_ok());
    }
}
