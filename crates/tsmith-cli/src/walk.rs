//! Recursive directory walking filtered by extension.

use std::io;
use std::path::{Path, PathBuf};

/// Walks every file under `root` (recursively) whose name ends with `ext`,
/// invoking `on_file` with the absolute path and the path relative to `base`
/// (which defaults to `root`). Entries are visited in sorted order so callers
/// see a deterministic sequence.
///
/// Returns an error if `root` does not exist.
pub fn walk(
    root: &Path,
    ext: &str,
    base: Option<&Path>,
    on_file: &mut dyn FnMut(&Path, &Path),
) -> io::Result<()> {
    if !root.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("directory does not exist: {}", root.display()),
        ));
    }
    let base = base.unwrap_or(root);
    walk_dir(root, ext, base, on_file)
}

fn walk_dir(
    dir: &Path,
    ext: &str,
    base: &Path,
    on_file: &mut dyn FnMut(&Path, &Path),
) -> io::Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk_dir(&path, ext, base, on_file)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(ext))
        {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            on_file(&path, relative);
        }
    }
    Ok(())
}
