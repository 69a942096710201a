#![allow(dead_code)]

use std::path::PathBuf;

pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh database path for the named test, removing any leftover file.
pub fn db_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("cipherlite-test-{}.db", name));
    let _ = std::fs::remove_file(&path);
    path
}
