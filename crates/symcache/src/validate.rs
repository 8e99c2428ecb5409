//! Content validation of downloaded symbol files.
//!
//! Policy is allow-by-default: the structural parser runs on every file, but
//! only a short denylist of kernel images must carry type information. Those
//! are known to be served stripped from time to time; they parse fine and are
//! useless to a debugger.

use std::path::Path;

use tracing::warn;

/// Kernel image symbol files that must report a non-zero type count.
pub const TYPE_INFO_REQUIRED: [&str; 2] = ["ntoskrnl.pdb", "ntkrnlmp.pdb"];

/// Structural statistics reported by a symbol-file parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdbStats {
    /// Number of records in the type-information stream.
    pub type_count: u32,

    /// Number of streams in the container directory.
    pub stream_count: u32,

    /// Container block size in bytes.
    pub block_size: u32,
}

/// Parser failures.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an MSF 7.00 file")]
    BadMagic,

    #[error("malformed file: {0}")]
    Malformed(String),
}

/// Structural parser collaborator. Must not modify the file.
pub trait SymbolParser: Send + Sync {
    fn stats(&self, path: &Path) -> Result<PdbStats, ParseError>;
}

/// Decide whether a downloaded file may be committed.
///
/// `name` is the caller's original file name, not the lowercased path part.
/// Returns the rejection reason on failure.
pub(crate) fn check_file(parser: &dyn SymbolParser, name: &str, path: &Path) -> Result<(), String> {
    let stats = parser.stats(path).map_err(|e| {
        warn!(path = %path.display(), error = %e, "symbol file failed to parse");
        format!("unparsable symbol file: {}", e)
    })?;

    if requires_type_info(name) && stats.type_count == 0 {
        return Err(format!("{} carries no type information", name));
    }

    Ok(())
}

fn requires_type_info(name: &str) -> bool {
    TYPE_INFO_REQUIRED
        .iter()
        .any(|denied| name.eq_ignore_ascii_case(denied))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStats(u32);

    impl SymbolParser for FixedStats {
        fn stats(&self, _path: &Path) -> Result<PdbStats, ParseError> {
            Ok(PdbStats {
                type_count: self.0,
                ..PdbStats::default()
            })
        }
    }

    struct Failing;

    impl SymbolParser for Failing {
        fn stats(&self, _path: &Path) -> Result<PdbStats, ParseError> {
            Err(ParseError::BadMagic)
        }
    }

    #[test]
    fn test_kernel_without_types_rejected() {
        let path = Path::new("unused");
        assert!(check_file(&FixedStats(0), "ntoskrnl.pdb", path).is_err());
        assert!(check_file(&FixedStats(0), "NTKRNLMP.PDB", path).is_err());
    }

    #[test]
    fn test_kernel_with_types_accepted() {
        let path = Path::new("unused");
        assert!(check_file(&FixedStats(1), "ntoskrnl.pdb", path).is_ok());
        assert!(check_file(&FixedStats(9000), "NtKrnlMp.pdb", path).is_ok());
    }

    #[test]
    fn test_other_names_accepted_without_types() {
        let path = Path::new("unused");
        assert!(check_file(&FixedStats(0), "kernel32.pdb", path).is_ok());
        // Exact match only.
        assert!(check_file(&FixedStats(0), "ntoskrnl.pdb.bak", path).is_ok());
        assert!(check_file(&FixedStats(0), "xntkrnlmp.pdb", path).is_ok());
    }

    #[test]
    fn test_parse_failure_rejects_any_name() {
        let path = Path::new("unused");
        let reason = check_file(&Failing, "kernel32.pdb", path).unwrap_err();
        assert!(reason.contains("unparsable"));
    }
}
