//! Public data types: symbol keys, configuration, download outcomes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies one version of a symbol file on a symbol server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    name: String,
    guid: String,
    age: u32,
}

impl SymbolKey {
    pub fn new(name: impl Into<String>, guid: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            guid: guid.into(),
            age,
        }
    }

    /// File name as given by the caller (e.g. "ntkrnlmp.pdb").
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:x}", self.name, self.guid, self.age)
    }
}

/// How `download` calls exclude each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockScope {
    /// One lock around the whole download body; every key is serialized.
    #[default]
    Global,

    /// One lock per relative path; distinct keys download concurrently.
    PerKey,
}

impl FromStr for LockScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per-key" | "per_key" | "perkey" => Ok(Self::PerKey),
            other => Err(format!(
                "unknown lock scope '{}' (expected 'global' or 'per-key')",
                other
            )),
        }
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::PerKey => f.write_str("per-key"),
        }
    }
}

/// Symbol cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolCacheConfig {
    /// Root directory of the on-disk cache.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Symbol server base URL.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Request timeout in seconds. `None` means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Lock granularity for concurrent downloads.
    #[serde(default)]
    pub lock_scope: LockScope,

    /// Maximum number of redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join("symcache").join("symbols"))
        .unwrap_or_else(|| PathBuf::from("/tmp/symcache/symbols"))
}

fn default_server_url() -> String {
    "https://msdl.microsoft.com/download/symbols".to_string()
}

fn default_max_redirects() -> usize {
    10
}

impl Default for SymbolCacheConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            server_url: default_server_url(),
            timeout_secs: None,
            lock_scope: LockScope::default(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl SymbolCacheConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SYMCACHE_ROOT` | Cache root directory |
    /// | `SYMCACHE_SERVER_URL` | Symbol server base URL |
    /// | `SYMCACHE_TIMEOUT` | Request timeout in seconds (unset: none) |
    /// | `SYMCACHE_LOCK_SCOPE` | `global` or `per-key` |
    pub fn from_env() -> Self {
        Self {
            cache_root: std::env::var_os("SYMCACHE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(default_cache_root),
            server_url: std::env::var("SYMCACHE_SERVER_URL")
                .unwrap_or_else(|_| default_server_url()),
            timeout_secs: std::env::var("SYMCACHE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok()),
            lock_scope: std::env::var("SYMCACHE_LOCK_SCOPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            max_redirects: default_max_redirects(),
        }
    }

    /// Set the cache root.
    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Set the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set a request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the lock scope.
    pub fn with_lock_scope(mut self, scope: LockScope) -> Self {
        self.lock_scope = scope;
        self
    }
}

/// Successful result of a download call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File was already present; nothing was fetched.
    CacheHit,

    /// File was fetched, validated and committed.
    Committed,
}
