//! Bulk output: write every (or a chosen set of) version of a source.
//!
//! Each version is written against one base path following
//! [`OutputBase`](crate::naming::OutputBase):
//!
//! ```text
//! base = pics/cat.jpg (existing file)     base = out/ (directory)
//! pics/cat-thumb.jpg                      out/thumb.jpg
//! pics/cat-blurred.jpg                    out/blurred.jpg
//! pics/cat-blurred_thumb.jpg              out/blurred_thumb.jpg
//! ```
//!
//! One handle serves all versions of a source: every write resets it, so each
//! version starts from a fresh load of the source.
//!
//! ## Progress
//!
//! Callers pass an optional [`Sender`] and receive [`ProcessEvent`]s as
//! work happens. The CLI renders them on a printer thread with
//! [`format_process_event`](crate::output::format_process_event).

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::ImageBackend;
use crate::naming::OutputBase;
use crate::versions::VersionRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Progress events emitted during bulk processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    SourceStarted {
        source: PathBuf,
        version_count: usize,
    },
    VersionWritten {
        version: String,
        path: PathBuf,
    },
    /// The version ran but had nothing to write.
    VersionSkipped { version: String },
    VersionFailed { version: String, error: String },
}

/// One written output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenVersion {
    pub version: String,
    pub path: PathBuf,
}

/// Everything written for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: PathBuf,
    pub versions: Vec<WrittenVersion>,
}

fn emit(progress: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        tx.send(event).ok();
    }
}

/// The versions to write: `names` if given, otherwise all registered ones.
///
/// Unknown names fail before anything is written.
fn select_versions<B: ImageBackend>(
    registry: &VersionRegistry<B>,
    names: &[String],
) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok(registry
            .list_versions()
            .into_iter()
            .map(String::from)
            .collect());
    }
    if let Some(unknown) = names.iter().find(|n| !registry.contains(n)) {
        return Err(ProcessError::Configuration(format!(
            "unknown version '{}' (known: {})",
            unknown,
            registry.list_versions().join(", ")
        )));
    }
    Ok(names.to_vec())
}

/// Write the selected versions of `handle`'s source under `base`.
///
/// The base directory is created when missing. The first failing version
/// aborts the run.
pub fn write_versions<B: ImageBackend>(
    registry: &VersionRegistry<B>,
    handle: &mut ImageHandle<B>,
    base: &Path,
    names: &[String],
    progress: Option<&Sender<ProcessEvent>>,
) -> Result<Vec<WrittenVersion>> {
    let versions = select_versions(registry, names)?;
    let base = OutputBase::detect(base);
    let directory = base.directory();
    if !directory.as_os_str().is_empty() {
        std::fs::create_dir_all(directory)?;
    }

    let mut written = Vec::with_capacity(versions.len());
    for version in versions {
        let destination = base.version_path(handle.source(), &version);
        match registry.invoke(handle, &version, Some(destination), true) {
            Ok(Some(path)) => {
                log::info!("{} -> {}", version, path.display());
                emit(
                    progress,
                    ProcessEvent::VersionWritten {
                        version: version.clone(),
                        path: path.clone(),
                    },
                );
                written.push(WrittenVersion { version, path });
            }
            Ok(None) => emit(progress, ProcessEvent::VersionSkipped { version }),
            Err(e) => {
                emit(
                    progress,
                    ProcessEvent::VersionFailed {
                        version,
                        error: e.to_string(),
                    },
                );
                return Err(e);
            }
        }
    }
    Ok(written)
}

/// Sources sharing a directory base are written to `base/<stem>/`, so two
/// sources with the same stem would overwrite each other.
fn check_distinct_stems(sources: &[PathBuf]) -> Result<()> {
    let mut seen: BTreeMap<&OsStr, &Path> = BTreeMap::new();
    for source in sources {
        let stem = source.file_stem().unwrap_or(source.as_os_str());
        if let Some(first) = seen.insert(stem, source) {
            return Err(ProcessError::Configuration(format!(
                "{} and {} would both write to '{}'",
                first.display(),
                source.display(),
                stem.to_string_lossy()
            )));
        }
    }
    Ok(())
}

/// Write versions for each source in turn.
///
/// `base` defaults to the source itself, which puts the versions next to
/// it. With several sources and a directory base, each source gets its own
/// subdirectory named after its file stem so outputs do not collide. Two
/// sources with the same stem are rejected before anything is written.
pub fn process_sources<B: ImageBackend + Clone>(
    backend: &B,
    registry: &VersionRegistry<B>,
    sources: &[PathBuf],
    base: Option<&Path>,
    names: &[String],
    progress: Option<Sender<ProcessEvent>>,
) -> Result<Vec<SourceReport>> {
    if let Some(base) = base {
        if sources.len() > 1 && base.is_file() {
            return Err(ProcessError::Configuration(format!(
                "output {} is a file but {} sources were given",
                base.display(),
                sources.len()
            )));
        }
    }

    if base.is_some() && sources.len() > 1 {
        check_distinct_stems(sources)?;
    }

    let version_count = select_versions(registry, names)?.len();
    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        let base = match base {
            None => source.clone(),
            Some(base) if sources.len() > 1 => {
                let stem = source.file_stem().unwrap_or(source.as_os_str());
                base.join(stem)
            }
            Some(base) => base.to_path_buf(),
        };

        emit(
            progress.as_ref(),
            ProcessEvent::SourceStarted {
                source: source.clone(),
                version_count,
            },
        );
        let mut handle = ImageHandle::new(backend.clone(), source);
        let versions = write_versions(registry, &mut handle, &base, names, progress.as_ref())?;
        reports.push(SourceReport {
            source: source.clone(),
            versions,
        });
    }
    Ok(reports)
}
