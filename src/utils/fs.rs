//! Directory copy helpers for assembling a branch snapshot.

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Name of the version-control metadata directory never carried by copies.
const GIT_DIR: &str = ".git";

/// A filesystem operation failed on `path`.
#[derive(Debug, Error)]
#[error("filesystem error at `{path}`")]
pub struct FsError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FsError {
    pub fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<walkdir::Error> for FsError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            source: err.into(),
        }
    }
}

/// Recursively copy the contents of `from` into `to`, overwriting files.
///
/// Existing entries in `to` that `from` lacks are left alone. A `.git`
/// directory directly under `from` is skipped. Symlinks already present in
/// `to` are replaced, never written through. Returns the number of files
/// written.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, FsError> {
    if !from.is_dir() {
        return Err(FsError::new(
            from,
            io::Error::new(io::ErrorKind::NotFound, "source directory does not exist"),
        ));
    }
    make_room(to, true)?;
    fs::create_dir_all(to).map_err(|err| FsError::new(to, err))?;

    let walker = WalkDir::new(from)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == GIT_DIR));

    let mut copied = 0;
    for entry in walker {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            make_room(&dest, true)?;
            fs::create_dir_all(&dest).map_err(|err| FsError::new(&dest, err))?;
        } else if file_type.is_symlink() {
            make_room(&dest, false)?;
            copy_symlink(entry.path(), &dest)?;
            copied += 1;
        } else {
            make_room(&dest, false)?;
            fs::copy(entry.path(), &dest).map_err(|err| FsError::new(&dest, err))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Clear whatever sits at `path` unless it already is a real directory and
/// `dir` asks for one. Symlinks are removed themselves, never followed.
fn make_room(path: &Path, dir: bool) -> Result<(), FsError> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    let file_type = meta.file_type();
    if file_type.is_dir() {
        if dir {
            return Ok(());
        }
        return fs::remove_dir_all(path).map_err(|err| FsError::new(path, err));
    }
    remove_link_or_file(path)
}

#[cfg(windows)]
fn remove_link_or_file(path: &Path) -> Result<(), FsError> {
    // Directory symlinks are removed like directories on Windows
    fs::remove_file(path)
        .or_else(|_| fs::remove_dir(path))
        .map_err(|err| FsError::new(path, err))
}

#[cfg(not(windows))]
fn remove_link_or_file(path: &Path) -> Result<(), FsError> {
    fs::remove_file(path).map_err(|err| FsError::new(path, err))
}

/// Recreate the symlink at `src` as `dest`.
#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), FsError> {
    let target = fs::read_link(src).map_err(|err| FsError::new(src, err))?;
    std::os::unix::fs::symlink(target, dest).map_err(|err| FsError::new(dest, err))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<(), FsError> {
    fs::copy(src, dest)
        .map(|_| ())
        .map_err(|err| FsError::new(dest, err))
}

/// Make `dir` an existing, empty, real directory.
///
/// A symlink at `dir` is replaced by a directory; its target is not touched.
pub fn empty_dir(dir: &Path) -> Result<(), FsError> {
    make_room(dir, true)?;
    if fs::symlink_metadata(dir).is_err() {
        return fs::create_dir_all(dir).map_err(|err| FsError::new(dir, err));
    }

    for entry in fs::read_dir(dir).map_err(|err| FsError::new(dir, err))? {
        let entry = entry.map_err(|err| FsError::new(dir, err))?;
        let path = entry.path();
        // `DirEntry::file_type` does not follow symlinks
        let is_dir = entry
            .file_type()
            .map_err(|err| FsError::new(&path, err))?
            .is_dir();
        if is_dir {
            fs::remove_dir_all(&path).map_err(|err| FsError::new(&path, err))?;
        } else {
            remove_link_or_file(&path)?;
        }
    }

    Ok(())
}
