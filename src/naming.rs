//! Output path conventions.
//!
//! Two rules live here:
//!
//! - **Temporary files**: the output stage writes to the destination with
//!   `_tmp` inserted before the final extension, then renames.
//!   - `out/photo.jpg` → `out/photo_tmp.jpg`
//!   - `out/archive.tar.gz` → `out/archive.tar_tmp.gz`
//!   - `out/README` → `out/README_tmp`
//! - **Bulk version output**: where each version of a source lands when all
//!   versions are written against one base path.
//!   - base is an existing file `pics/cat.jpg` → `pics/cat-thumb.jpg`
//!   - base is a directory `out/` → `out/thumb.jpg` (extension from the source)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Destination with `_tmp` inserted before the final extension.
pub fn temp_path(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(OsString::from)
        .unwrap_or_default();

    let mut name = stem;
    name.push("_tmp");
    if let Some(ext) = destination.extension() {
        name.push(".");
        name.push(ext);
    }
    destination.with_file_name(name)
}

/// Where a base path sends its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBase {
    /// Base is an existing file: versions go next to it as `<stem>-<version><ext>`.
    File(PathBuf),
    /// Base is a directory (or does not exist yet): versions go inside it.
    Directory(PathBuf),
}

impl OutputBase {
    /// Classify `base` by looking at the filesystem.
    pub fn detect(base: &Path) -> Self {
        if base.is_file() {
            OutputBase::File(base.to_path_buf())
        } else {
            OutputBase::Directory(base.to_path_buf())
        }
    }

    /// Directory that has to exist before writing.
    pub fn directory(&self) -> &Path {
        match self {
            OutputBase::File(file) => file.parent().unwrap_or(Path::new("")),
            OutputBase::Directory(dir) => dir,
        }
    }

    /// Output path for `version` of `source`.
    pub fn version_path(&self, source: &Path, version: &str) -> PathBuf {
        match self {
            OutputBase::File(file) => {
                let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("");
                let name = format!("{}-{}{}", stem, version, dotted_extension(file));
                self.directory().join(name)
            }
            OutputBase::Directory(dir) => {
                dir.join(format!("{}{}", version, dotted_extension(source)))
            }
        }
    }
}

/// `.ext` for a path with an extension, empty otherwise.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}
