use symcache::SymbolCache;

use super::EXIT_SUCCESS;
use crate::cli::args::KeyArgs;

pub fn run(cache: &SymbolCache, args: &KeyArgs) -> anyhow::Result<i32> {
    match cache.resolve_path(&args.to_key()) {
        Ok(path) => {
            println!("{}", path.display());
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(e.exit_code())
        }
    }
}
