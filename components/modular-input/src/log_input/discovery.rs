// External crates
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Data files to read for one stanza.
///
/// A file `root` is returned as-is. A directory is walked (one level unless
/// `recursive`) for visible files whose extension is in `extensions`, sorted
/// by path so events come out in a stable order.
pub fn discover_files(root: &Path, recursive: bool, extensions: &[String]) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .same_file_system(true)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, root = %root.display(), "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| is_data_file(entry, extensions))
        .map(DirEntry::into_path)
        .collect();
    files.sort();

    debug!(
        root = %root.display(),
        recursive,
        ?extensions,
        discovered = files.len(),
        "Discovered data files"
    );
    files
}

/// Non-directory, not hidden, and carrying one of the stanza's extensions.
fn is_data_file(entry: &DirEntry, extensions: &[String]) -> bool {
    if entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return false;
    }

    entry
        .path()
        .extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&ext)))
}
