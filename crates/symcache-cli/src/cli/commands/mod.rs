use std::path::Path;

use anyhow::Context;
use symcache::{SymbolCache, SymbolCacheConfig};

use super::args::{Cli, Command};

pub mod fetch;
pub mod path;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIG_ERROR: i32 = 1;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = resolve_config(&cli)?;
    let cache = SymbolCache::from_config(config);
    if !cache.valid() {
        eprintln!("error: symbol cache is not usable; check --cache-root and --server");
        return Ok(EXIT_CONFIG_ERROR);
    }

    match cli.cmd {
        Command::Fetch(args) => fetch::run(&cache, &args).await,
        Command::Path(args) => path::run(&cache, &args),
    }
}

/// Config file (or defaults), then flags and env variables on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<SymbolCacheConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => SymbolCacheConfig::default(),
    };

    if let Some(root) = &cli.cache_root {
        config = config.with_cache_root(root);
    }
    if let Some(url) = &cli.server_url {
        config = config.with_server_url(url);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout_secs(secs);
    }
    if let Some(scope) = cli.lock_scope {
        config = config.with_lock_scope(scope);
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn load_config_file(path: &Path) -> anyhow::Result<SymbolCacheConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}
