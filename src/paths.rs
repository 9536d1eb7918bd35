use std::path::{Path, PathBuf};

/// `<dir>/<file><suffix>`, next to `path`; used for temp and staging files.
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
