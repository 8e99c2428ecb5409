use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn symcache() -> Command {
    let mut cmd = Command::cargo_bin("symcache").unwrap();
    cmd.env_remove("SYMCACHE_CONFIG")
        .env_remove("SYMCACHE_ROOT")
        .env_remove("SYMCACHE_SERVER_URL")
        .env_remove("SYMCACHE_TIMEOUT")
        .env_remove("SYMCACHE_LOCK_SCOPE");
    cmd
}

#[test]
fn test_path_prints_layout() {
    let dir = TempDir::new().unwrap();
    let expected = dir
        .path()
        .join("foo.pdb")
        .join("ABCD1234ABCD1234ABCD1234ABCD12342")
        .join("foo.pdb");

    symcache()
        .arg("--cache-root")
        .arg(dir.path())
        .args(["--server", "http://127.0.0.1:1/sym"])
        .args(["path", "Foo.pdb", "abcd1234abcd1234abcd1234abcd1234", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_path_accepts_hex_age() {
    let dir = TempDir::new().unwrap();

    symcache()
        .arg("--cache-root")
        .arg(dir.path())
        .args(["--server", "http://127.0.0.1:1/sym"])
        .args(["path", "ntkrnlmp.pdb", "00ff", "0x1f"])
        .assert()
        .success()
        .stdout(predicate::str::contains("00FF1f"));
}

#[test]
fn test_invalid_server_exits_with_config_error() {
    let dir = TempDir::new().unwrap();

    symcache()
        .arg("--cache-root")
        .arg(dir.path())
        .args(["--server", "not a url with spaces and no host separator???"])
        .args(["fetch", "foo.pdb", "abcd", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not usable"));
}

#[test]
fn test_fetch_cache_hit_needs_no_server() {
    let dir = TempDir::new().unwrap();
    let cached = dir.path().join("foo.pdb").join("ABCD1").join("foo.pdb");
    std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
    std::fs::write(&cached, b"local").unwrap();

    symcache()
        .arg("--cache-root")
        .arg(dir.path())
        .args(["--server", "http://127.0.0.1:1/sym"])
        .args(["fetch", "foo.pdb", "abcd", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(cached.display().to_string()));
}

#[test]
fn test_fetch_unreachable_server_exits_with_transport_code() {
    let dir = TempDir::new().unwrap();

    symcache()
        .arg("--cache-root")
        .arg(dir.path())
        .args(["--server", "http://127.0.0.1:1/sym"])
        .args(["fetch", "foo.pdb", "abcd", "1"])
        .assert()
        .code(5);
}

#[test]
fn test_config_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("from-config");
    let config_path = dir.path().join("symcache.yaml");
    std::fs::write(
        &config_path,
        format!(
            "cache_root: {}\nserver_url: http://127.0.0.1:1/sym\n",
            root.display()
        ),
    )
    .unwrap();

    symcache()
        .arg("--config")
        .arg(&config_path)
        .args(["path", "foo.pdb", "abcd", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            root.join("foo.pdb").display().to_string(),
        ));
}
