//! CLI output formatting.
//!
//! Every command has a `format_*` function returning `Vec<String>` and a
//! `print_*` wrapper that writes the lines to stdout. Format functions are
//! pure: no I/O, no side effects.
//!
//! ## Run
//!
//! ```text
//! photo.jpg (3 versions)
//!     blurred → photo-blurred.jpg
//!     blurred_thumb → photo-blurred_thumb.jpg
//!     thumb → photo-thumb.jpg
//! Wrote 3 files for 1 source
//! ```
//!
//! ## List
//!
//! ```text
//! blurred
//!     gaussian_blur sigma=10 min_amplitude=0.2
//! blurred_thumb
//!     Depends on: thumb, blurred
//!     Runs: thumb → blurred → blurred_thumb
//! ```

use crate::config::VersionsConfig;
use crate::imaging::ImageBackend;
use crate::process::{ProcessEvent, SourceReport};
use crate::versions::VersionRegistry;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Run
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::SourceStarted {
            source,
            version_count,
        } => vec![format!(
            "{} ({})",
            display_name(source),
            plural(*version_count, "version")
        )],
        ProcessEvent::VersionWritten { version, path } => {
            vec![format!("{}{} \u{2192} {}", indent(1), version, path.display())]
        }
        ProcessEvent::VersionSkipped { version } => {
            vec![format!("{}{}: nothing to write", indent(1), version)]
        }
        ProcessEvent::VersionFailed { version, error } => {
            vec![format!("{}{}: FAILED {}", indent(1), version, error)]
        }
    }
}

/// One-line summary after a run.
pub fn format_run_summary(reports: &[SourceReport]) -> Vec<String> {
    let files: usize = reports.iter().map(|r| r.versions.len()).sum();
    vec![format!(
        "Wrote {} for {}",
        plural(files, "file"),
        plural(reports.len(), "source")
    )]
}

pub fn print_run_summary(reports: &[SourceReport]) {
    for line in format_run_summary(reports) {
        println!("{}", line);
    }
}

// ============================================================================
// List / check
// ============================================================================

/// Describe every version: its steps, dependencies and run order.
pub fn format_version_list<B: ImageBackend>(
    config: &VersionsConfig,
    registry: &VersionRegistry<B>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, version) in &config.versions {
        lines.push(name.clone());
        if !version.dependencies.is_empty() {
            lines.push(format!(
                "{}Depends on: {}",
                indent(1),
                version.dependencies.join(", ")
            ));
            if let Ok(chain) = registry.resolve(name) {
                let order: Vec<&str> = chain.iter().map(|v| v.name.as_str()).collect();
                lines.push(format!("{}Runs: {}", indent(1), order.join(" \u{2192} ")));
            }
        }
        for step in &version.steps {
            lines.push(format!("{}{}", indent(1), step));
        }
    }
    lines
}

pub fn print_version_list<B: ImageBackend>(config: &VersionsConfig, registry: &VersionRegistry<B>) {
    for line in format_version_list(config, registry) {
        println!("{}", line);
    }
}

/// Summary for a config that passed validation.
pub fn format_check_output(path: &Path, config: &VersionsConfig) -> Vec<String> {
    vec![format!(
        "{}: {} OK",
        path.display(),
        plural(config.versions.len(), "version")
    )]
}

pub fn print_check_output(path: &Path, config: &VersionsConfig) {
    for line in format_check_output(path, config) {
        println!("{}", line);
    }
}
