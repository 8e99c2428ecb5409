use symcache::{DownloadOutcome, SymbolCache};

use super::EXIT_SUCCESS;
use crate::cli::args::KeyArgs;

pub async fn run(cache: &SymbolCache, args: &KeyArgs) -> anyhow::Result<i32> {
    let key = args.to_key();

    let outcome = match cache.download(&key).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(e.exit_code());
        }
    };

    let path = cache.resolve_path(&key)?;
    match outcome {
        DownloadOutcome::CacheHit => tracing::debug!(path = %path.display(), "served from cache"),
        DownloadOutcome::Committed => tracing::debug!(path = %path.display(), "downloaded"),
    }
    println!("{}", path.display());
    Ok(EXIT_SUCCESS)
}
