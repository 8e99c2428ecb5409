//! On-demand local cache for PDB debug symbols.
//!
//! Given a symbol key (file name, GUID, age) the cache derives the usual
//! symbol-server path, serves the file from disk when present, and otherwise
//! fetches it over HTTP, checks it, and commits it atomically:
//!
//! - Path layout `{name}/{GUID}{age:x}/{name}` shared with symbol servers
//! - Size check against `Content-Length` before anything touches the disk
//! - Temp write, structural validation, rename into place
//! - Whole-download locking, optionally per key
//!
//! # Quick Start
//!
//! ```no_run
//! use symcache::{SymbolCache, SymbolKey};
//!
//! # async fn example() -> Result<(), symcache::SymbolCacheError> {
//! let cache = SymbolCache::new("/var/cache/symbols", "https://msdl.microsoft.com/download/symbols");
//! assert!(cache.valid());
//!
//! let key = SymbolKey::new("ntkrnlmp.pdb", "3844DBB920174967BE7AA4A2C20430FA", 1);
//! cache.download(&key).await?;
//! println!("cached at {}", cache.resolve_path(&key)?.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SYMCACHE_ROOT` | Cache root (default: `<user cache dir>/symcache/symbols`) |
//! | `SYMCACHE_SERVER_URL` | Symbol server (default: `https://msdl.microsoft.com/download/symbols`) |
//! | `SYMCACHE_TIMEOUT` | Request timeout in seconds (default: none) |
//! | `SYMCACHE_LOCK_SCOPE` | `global` (default) or `per-key` |

pub mod cache;
pub mod error;
mod fetch;
mod io;
pub mod layout;
mod lock;
pub mod msf;
pub mod server;
pub mod types;
pub mod validate;

// Re-export main types
pub use cache::SymbolCache;
pub use error::{SymbolCacheError, SymbolCacheResult};
pub use layout::{relative_path, TEMP_EXTENSION};
pub use msf::MsfParser;
pub use server::ServerAddress;
pub use types::{DownloadOutcome, LockScope, SymbolCacheConfig, SymbolKey};
pub use validate::{ParseError, PdbStats, SymbolParser, TYPE_INFO_REQUIRED};
