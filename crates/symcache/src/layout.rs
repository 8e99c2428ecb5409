//! Cache layout: symbol key to relative path.
//!
//! ```text
//! {cache_root}/{lower(name)}/{UPPER(guid)}{hex(age)}/{lower(name)}
//! ```
//!
//! This is the usual symbol-server directory convention, so an existing
//! cache tree or server mirror can be shared as-is.

use std::path::{Path, PathBuf};

use crate::error::{SymbolCacheError, SymbolCacheResult};
use crate::types::SymbolKey;

/// Extension used for in-flight downloads next to the final file.
pub const TEMP_EXTENSION: &str = "tmp";

/// Relative path of a symbol inside the cache (and on the server).
///
/// Age is lowercase hex without padding or prefix, appended directly to the
/// uppercased GUID.
pub fn relative_path(key: &SymbolKey) -> String {
    let name = key.name().to_ascii_lowercase();
    format!(
        "{}/{}{:x}/{}",
        name,
        key.guid().to_ascii_uppercase(),
        key.age(),
        name
    )
}

/// Join a relative symbol path onto the cache root.
pub(crate) fn absolute_path(cache_root: &Path, relative_path: &str) -> PathBuf {
    relative_path
        .split('/')
        .fold(cache_root.to_path_buf(), |path, part| path.join(part))
}

/// Temp sibling used while a download is written and validated. Never equal
/// to `final_path`, even for names already ending in the temp extension.
pub(crate) fn temp_path(final_path: &Path) -> PathBuf {
    let temp = final_path.with_extension(TEMP_EXTENSION);
    if temp != final_path {
        return temp;
    }
    let mut raw = final_path.as_os_str().to_owned();
    raw.push(".");
    raw.push(TEMP_EXTENSION);
    PathBuf::from(raw)
}

/// Refuse keys whose components would escape their cache directory.
pub(crate) fn check_key(key: &SymbolKey) -> SymbolCacheResult<()> {
    check_component("name", key.name())?;
    check_component("guid", key.guid())?;
    Ok(())
}

fn check_component(field: &str, value: &str) -> SymbolCacheResult<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '\0'])
        || value.chars().any(char::is_control);

    if bad {
        return Err(SymbolCacheError::InvalidKey {
            message: format!("{} {:?} is not a plain file name", field, value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_layout() {
        let key = SymbolKey::new("Foo.pdb", "abcd1234abcd1234abcd1234abcd1234", 2);
        assert_eq!(
            relative_path(&key),
            "foo.pdb/ABCD1234ABCD1234ABCD1234ABCD12342/foo.pdb"
        );
    }

    #[test]
    fn test_relative_path_hex_age_unpadded() {
        let key = SymbolKey::new("ntkrnlmp.pdb", "3844dbb920174967be7aa4a2c20430fa", 0x1f);
        assert_eq!(
            relative_path(&key),
            "ntkrnlmp.pdb/3844DBB920174967BE7AA4A2C20430FA1f/ntkrnlmp.pdb"
        );

        let key = SymbolKey::new("a.pdb", "ff", 0);
        assert_eq!(relative_path(&key), "a.pdb/FF0/a.pdb");
    }

    #[test]
    fn test_relative_path_deterministic() {
        let key = SymbolKey::new("Kernel32.PDB", "deadBEEF", 7);
        let first = relative_path(&key);
        let second = relative_path(&key.clone());
        assert_eq!(first, second);
        assert_eq!(first, "kernel32.pdb/DEADBEEF7/kernel32.pdb");
    }

    #[test]
    fn test_absolute_and_temp_path() {
        let root = Path::new("/cache");
        let path = absolute_path(root, "foo.pdb/ABC2/foo.pdb");
        assert_eq!(path, Path::new("/cache/foo.pdb/ABC2/foo.pdb"));
        assert_eq!(temp_path(&path), Path::new("/cache/foo.pdb/ABC2/foo.tmp"));
    }

    #[test]
    fn test_temp_path_never_equals_final() {
        let path = Path::new("/cache/odd.tmp/ABC2/odd.tmp");
        assert_eq!(temp_path(path), Path::new("/cache/odd.tmp/ABC2/odd.tmp.tmp"));
    }

    #[test]
    fn test_check_key_rejects_traversal() {
        assert!(check_key(&SymbolKey::new("foo.pdb", "ABC", 1)).is_ok());
        assert!(check_key(&SymbolKey::new("../foo.pdb", "ABC", 1)).is_err());
        assert!(check_key(&SymbolKey::new("..", "ABC", 1)).is_err());
        assert!(check_key(&SymbolKey::new("foo.pdb", "A\\B", 1)).is_err());
        assert!(check_key(&SymbolKey::new("", "ABC", 1)).is_err());
        assert!(check_key(&SymbolKey::new("foo.pdb", "", 1)).is_err());
    }
}
