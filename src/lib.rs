//! # Image Versions
//!
//! Declarative derivation of image versions. A version is a named recipe
//! (resize, crop, blur, quality, convert, strip, auto-orient) that may build
//! on other versions, so shared preprocessing is written once.
//!
//! # Architecture
//!
//! ```text
//! VersionRegistry ──resolve──▶ [dep, dep, …, version]
//!        │
//!        ▼ invoke
//! ImageHandle ──lazy load──▶ transforms (manipulate) ──▶ write (tmp + rename) ──▶ reset
//!        │
//!        ▼
//! ImageBackend (load / apply Operation / write)
//! ```
//!
//! Transforms never touch pixels directly. They decide which
//! [`imaging::Operation`]s to run, and the [`imaging::ImageBackend`] runs them.
//! Tests use a recording mock backend; production uses
//! [`imaging::RustBackend`].
//!
//! ```ignore
//! let mut registry = VersionRegistry::<RustBackend>::new();
//! registry
//!     .version("thumb", |h| h.resize_to_fit(150, 150).map(|_| ()))
//!     .version("blurred", |h| h.gaussian_blur(10.0).map(|_| ()));
//! registry.composite("blurred_thumb", ["thumb", "blurred"])?;
//!
//! let mut handle = ImageHandle::new(RustBackend::new(), "photo.jpg");
//! registry.invoke(&mut handle, "blurred_thumb", Some("photo-bt.jpg".into()), true)?;
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`versions`] | Version registry: registration, dependency resolution, invocation |
//! | [`handle`] | The image handle and its lazy-load manipulation accumulator |
//! | [`transform`] | Resize, crop, blur, quality, convert, strip, auto-orient |
//! | [`write`] | Output stage: writer effects, temp file + rename, reset |
//! | [`imaging`] | Backend trait, operation types, resize planner, kernels, pure-Rust backend |
//! | [`naming`] | Temp-file and bulk output naming |
//! | [`process`] | Writing many versions of many sources, with progress events |
//! | [`config`] | `versions.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//! | [`error`] | Error types |
//!
//! # Design Decisions
//!
//! ## Registries Are Values
//!
//! A [`versions::VersionRegistry`] is an ordinary value, created and passed
//! around explicitly. Two registries never see each other's versions and
//! there is no global table.
//!
//! ## Extension-Based Format Detection
//!
//! The decoder is picked from the source extension (`.jpg`/`.jpeg`, `.png`,
//! anything else generic), not from file contents. A mislabelled file fails
//! to load with an error that says so.
//!
//! ## Atomic Writes
//!
//! Output is encoded to `<name>_tmp.<ext>` and renamed onto the destination,
//! so a failed encode never leaves a half-written file behind.

pub mod config;
pub mod error;
pub mod handle;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod transform;
pub mod versions;
pub mod write;

pub use error::{ProcessError, Result};
pub use handle::ImageHandle;
pub use versions::{Version, VersionRegistry};

#[cfg(test)]
pub(crate) mod test_helpers;
