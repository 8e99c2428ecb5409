//! The symbol cache: lookup, fetch, validate, commit.
//!
//! # Protocol
//!
//! ```text
//! download(key)
//!   lock (global or per key, see LockScope)
//!   exists({root}/{relative})?        -> CacheHit, no re-validation
//!   GET {server}{prefix}{relative}    -> Transport on error or non-200
//!   Content-Length == body.len() > 0  -> SizeMismatch otherwise (also short bodies)
//!   write {relative stem}.tmp, fsync
//!   validate temp file                -> Validation (temp removed)
//!   rename temp -> final              -> Committed
//! ```
//!
//! A file at the final name is always complete and validated. The disk is
//! the only index, so several processes can share one cache root.
//!
//! Dropping a `download` future mid-validation releases the lock but not the
//! blocking parse: a stale `.tmp` and a detached parser may outlive it. The
//! next download rewrites that temp file and validates its own bytes, so the
//! final name is unaffected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::{SymbolCacheError, SymbolCacheResult};
use crate::fetch::HttpFetcher;
use crate::io;
use crate::layout;
use crate::lock::DownloadLocks;
use crate::msf::MsfParser;
use crate::server::ServerAddress;
use crate::types::{DownloadOutcome, LockScope, SymbolCacheConfig, SymbolKey};
use crate::validate::{self, SymbolParser};

/// Local cache of symbol files backed by a remote symbol server.
pub struct SymbolCache {
    cache_root: PathBuf,
    // Err holds the reason the cache is permanently unusable.
    backend: Result<HttpFetcher, SymbolCacheError>,
    parser: Arc<dyn SymbolParser>,
    locks: DownloadLocks,
}

impl std::fmt::Debug for SymbolCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolCache")
            .field("cache_root", &self.cache_root)
            .field("backend", &self.backend)
            .field("lock_scope", &self.locks.scope())
            .finish_non_exhaustive()
    }
}

impl SymbolCache {
    /// Create a cache with default settings for `cache_root` and `server_url`.
    ///
    /// Never fails; check [`SymbolCache::valid`] afterwards.
    pub fn new(cache_root: impl Into<PathBuf>, server_url: impl Into<String>) -> Self {
        Self::from_config(
            SymbolCacheConfig::default()
                .with_cache_root(cache_root)
                .with_server_url(server_url),
        )
    }

    /// Create a cache from a full configuration.
    pub fn from_config(config: SymbolCacheConfig) -> Self {
        info!(
            root = %config.cache_root.display(),
            server = %config.server_url,
            lock_scope = %config.lock_scope,
            "create symbol cache"
        );

        let backend = Self::build_backend(&config).inspect_err(|e| {
            error!(
                root = %config.cache_root.display(),
                server = %config.server_url,
                error = %e,
                "invalid symbol cache"
            );
        });

        Self {
            cache_root: config.cache_root,
            backend,
            parser: Arc::new(MsfParser),
            locks: DownloadLocks::new(config.lock_scope),
        }
    }

    fn build_backend(config: &SymbolCacheConfig) -> SymbolCacheResult<HttpFetcher> {
        if config.cache_root.as_os_str().is_empty() {
            return Err(SymbolCacheError::ConfigInvalid {
                message: "cache root is empty".to_string(),
            });
        }
        let server = ServerAddress::parse(&config.server_url)?;
        HttpFetcher::new(server, config)
    }

    /// Replace the structural parser used to validate downloads.
    pub fn with_parser(mut self, parser: Arc<dyn SymbolParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Whether construction succeeded. An invalid cache refuses every call.
    pub fn valid(&self) -> bool {
        self.backend.is_ok()
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Parsed server address, `None` when the cache is invalid.
    pub fn server(&self) -> Option<&ServerAddress> {
        self.backend.as_ref().ok().map(HttpFetcher::server)
    }

    pub fn lock_scope(&self) -> LockScope {
        self.locks.scope()
    }

    /// Absolute path a key maps to, whether or not it is cached. Takes no lock.
    pub fn resolve_path(&self, key: &SymbolKey) -> SymbolCacheResult<PathBuf> {
        self.fetcher()?;
        layout::check_key(key)?;
        Ok(layout::absolute_path(
            &self.cache_root,
            &layout::relative_path(key),
        ))
    }

    /// Make sure the file for `key` is in the cache, fetching it if needed.
    pub async fn download(&self, key: &SymbolKey) -> SymbolCacheResult<DownloadOutcome> {
        let fetcher = self.fetcher()?;
        layout::check_key(key)?;

        let relative_path = layout::relative_path(key);
        let path = layout::absolute_path(&self.cache_root, &relative_path);

        let _guard = self.locks.acquire(&relative_path).await;

        debug!(path = %relative_path, "lookup symbol");
        if io::exists(&path).await {
            info!(path = %relative_path, "symbol already cached");
            return Ok(DownloadOutcome::CacheHit);
        }

        info!(path = %relative_path, "download symbol");
        match self.fetch_and_commit(fetcher, key, &relative_path, &path).await {
            Ok(()) => {
                info!(path = %relative_path, "download symbol success");
                Ok(DownloadOutcome::Committed)
            }
            Err(e) => {
                error!(path = %relative_path, error = %e, "failed to download symbol");
                Err(e)
            }
        }
    }

    async fn fetch_and_commit(
        &self,
        fetcher: &HttpFetcher,
        key: &SymbolKey,
        relative_path: &str,
        path: &Path,
    ) -> SymbolCacheResult<()> {
        let body = fetcher.fetch(relative_path).await?;

        io::create_parent_dirs(path).await?;
        let temp = layout::temp_path(path);
        io::write_temp(&temp, &body).await?;
        drop(body);

        if let Err(reason) = self.validate(key.name(), &temp).await {
            io::discard(&temp).await;
            return Err(SymbolCacheError::Validation {
                path: relative_path.to_string(),
                reason,
            });
        }

        if let Err(e) = io::commit(&temp, path).await {
            io::discard(&temp).await;
            return Err(e);
        }
        Ok(())
    }

    async fn validate(&self, name: &str, temp: &Path) -> Result<(), String> {
        let parser = Arc::clone(&self.parser);
        let name = name.to_string();
        let temp = temp.to_path_buf();

        tokio::task::spawn_blocking(move || validate::check_file(parser.as_ref(), &name, &temp))
            .await
            .unwrap_or_else(|e| Err(format!("validator task failed: {}", e)))
    }

    fn fetcher(&self) -> SymbolCacheResult<&HttpFetcher> {
        self.backend.as_ref().map_err(SymbolCacheError::clone)
    }
}
