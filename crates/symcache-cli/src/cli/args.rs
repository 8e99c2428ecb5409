use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use symcache::LockScope;

#[derive(Parser)]
#[command(
    name = "symcache",
    version,
    about = "Fetch PDB symbols from a symbol server into a local cache"
)]
pub struct Cli {
    /// YAML config file; flags and env variables override its values
    #[arg(long, env = "SYMCACHE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, env = "SYMCACHE_ROOT", global = true)]
    pub cache_root: Option<PathBuf>,

    /// Symbol server URL (e.g. https://msdl.microsoft.com/download/symbols)
    #[arg(long = "server", env = "SYMCACHE_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Request timeout in seconds (default: none)
    #[arg(long, env = "SYMCACHE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Download locking: global or per-key
    #[arg(long, env = "SYMCACHE_LOCK_SCOPE", global = true)]
    pub lock_scope: Option<LockScope>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Make sure a symbol is cached, downloading it if needed; prints its path
    Fetch(KeyArgs),
    /// Print where a symbol is (or would be) cached, without fetching
    Path(KeyArgs),
}

#[derive(Args, Clone, Debug)]
pub struct KeyArgs {
    /// Symbol file name (e.g. ntkrnlmp.pdb)
    pub name: String,

    /// Build GUID, 32 hex digits
    pub guid: String,

    /// Age, decimal or 0x-prefixed hex
    #[arg(value_parser = parse_age)]
    pub age: u32,
}

impl KeyArgs {
    pub fn to_key(&self) -> symcache::SymbolKey {
        symcache::SymbolKey::new(&self.name, &self.guid, self.age)
    }
}

fn parse_age(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|e| format!("invalid age '{}': {}", raw, e))
}
