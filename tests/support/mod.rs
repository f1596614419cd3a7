#![allow(dead_code)]

pub mod socket_guard;

/// Writes `contents` to `name` inside `dir` and returns the path.
pub fn write_input(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
