// ABOUTME: File handling for deployment directories: copy, tree delete, containment.
// ABOUTME: Tree walks use an explicit stack so deep directories cannot overflow the call stack.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whether anything (file, directory or symlink) exists at `path`.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Copy a file or a whole directory tree to `dest`. Returns bytes copied.
pub fn copy_artifact(src: &Path, dest: &Path) -> io::Result<u64> {
    let meta = fs::metadata(src)?;
    if meta.is_file() {
        return fs::copy(src, dest);
    }

    let mut copied = 0;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];
    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to)?;
        for entry in fs::read_dir(&from)? {
            let entry = entry?;
            let target = to.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                copied += fs::copy(entry.path(), &target)?;
            }
        }
    }
    Ok(copied)
}

/// Delete a file or a directory tree. Symlinks are removed, never followed.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.is_dir() {
        return fs::remove_file(path);
    }

    // (path, children_already_queued)
    let mut stack = vec![(path.to_path_buf(), false)];
    while let Some((dir, expanded)) = stack.pop() {
        if expanded {
            fs::remove_dir(&dir)?;
            continue;
        }
        stack.push((dir.clone(), true));
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                stack.push((entry.path(), false));
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    }
    Ok(())
}

/// Whether `path` resolves to a location strictly inside `root`.
///
/// Both sides are canonicalized and compared component-wise, so a sibling
/// such as `webapps-old` does not pass for `webapps`, and symlinks or `..`
/// segments pointing outside the root are rejected. Unresolvable paths are
/// never contained.
pub fn is_contained(root: &Path, path: &Path) -> bool {
    let (Ok(root), Ok(path)) = (root.canonicalize(), path.canonicalize()) else {
        return false;
    };
    path != root && path.starts_with(&root)
}
