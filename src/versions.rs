//! Named versions and their dependency graph.
//!
//! A [`Version`] is a recipe (a closure over an [`ImageHandle`]) plus the
//! names of versions that must run before it. Invoking a version runs its
//! whole dependency chain against one handle and writes once at the end:
//!
//! ```text
//! thumb          = resize_to_fit(150, 150)
//! blurred        = gaussian_blur(10)
//! blurred_thumb  = [thumb, blurred]
//!
//! invoke(blurred_thumb):  load → thumb → blurred → write
//! ```
//!
//! Each registry is an ordinary value. Two registries never share versions.

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::ImageBackend;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// The transform body of a version.
pub type Recipe<B> = Arc<dyn Fn(&mut ImageHandle<B>) -> Result<()> + Send + Sync>;

pub struct Version<B: ImageBackend> {
    pub name: String,
    pub dependencies: Vec<String>,
    pub recipe: Option<Recipe<B>>,
}

impl<B: ImageBackend> Clone for Version<B> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dependencies: self.dependencies.clone(),
            recipe: self.recipe.clone(),
        }
    }
}

impl<B: ImageBackend> std::fmt::Debug for Version<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Version")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("has_recipe", &self.recipe.is_some())
            .finish()
    }
}

/// Table of versions for one kind of image.
pub struct VersionRegistry<B: ImageBackend> {
    versions: BTreeMap<String, Version<B>>,
}

impl<B: ImageBackend> std::fmt::Debug for VersionRegistry<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionRegistry")
            .field("versions", &self.list_versions())
            .finish()
    }
}

impl<B: ImageBackend> Default for VersionRegistry<B> {
    fn default() -> Self {
        Self {
            versions: BTreeMap::new(),
        }
    }
}

impl<B: ImageBackend> VersionRegistry<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a version.
    ///
    /// Fails when the version would do nothing: no recipe and no dependencies.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        dependencies: Vec<String>,
        recipe: Option<Recipe<B>>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if recipe.is_none() && dependencies.is_empty() {
            return Err(ProcessError::Configuration(format!(
                "version '{name}' needs a recipe or at least one dependency"
            )));
        }
        if self.versions.contains_key(&name) {
            log::debug!("version '{}' redefined", name);
        }
        self.versions.insert(
            name.clone(),
            Version {
                name,
                dependencies,
                recipe,
            },
        );
        Ok(self)
    }

    /// Register a version with a recipe and no dependencies.
    pub fn version<F>(&mut self, name: impl Into<String>, recipe: F) -> &mut Self
    where
        F: Fn(&mut ImageHandle<B>) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        self.versions.insert(
            name.clone(),
            Version {
                name,
                dependencies: Vec::new(),
                recipe: Some(Arc::new(recipe)),
            },
        );
        self
    }

    /// Register a version that only combines other versions.
    pub fn composite<I, S>(&mut self, name: impl Into<String>, dependencies: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies = dependencies.into_iter().map(Into::into).collect();
        self.register(name, dependencies, None)
    }

    pub fn get(&self, name: &str) -> Option<&Version<B>> {
        self.versions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.versions.contains_key(name)
    }

    /// Registered version names, sorted.
    pub fn list_versions(&self) -> Vec<&str> {
        self.versions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Flatten `name` into the order its recipes run.
    ///
    /// Dependencies come first, depth-first in declared order; a version
    /// reachable along several paths appears once, at its first position.
    /// `name` itself is last.
    pub fn resolve(&self, name: &str) -> Result<Vec<&Version<B>>> {
        let mut order = Vec::new();
        let mut path = Vec::new();
        self.visit(name, &mut path, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        path: &mut Vec<&'a str>,
        order: &mut Vec<&'a Version<B>>,
    ) -> Result<()> {
        let version = self
            .get(name)
            .ok_or_else(|| ProcessError::Configuration(format!("unknown version '{name}'")))?;

        if order.iter().any(|v| v.name == version.name) {
            return Ok(());
        }
        if path.contains(&version.name.as_str()) {
            path.push(&version.name);
            return Err(ProcessError::Configuration(format!(
                "cyclic version dependency: {}",
                path.join(" -> ")
            )));
        }

        path.push(&version.name);
        for dependency in &version.dependencies {
            self.visit(dependency, path, order)?;
        }
        path.pop();
        order.push(version);
        Ok(())
    }

    /// Run version `name` against `handle`.
    ///
    /// With `destination`, the handle writes there for this invocation only;
    /// its previous destination is restored afterwards, whether or not the
    /// invocation succeeded. With `should_write == false` the transformed
    /// image stays on the handle and nothing is written.
    ///
    /// Any failure resets the handle, so the next invocation loads the
    /// source afresh instead of continuing from a partial chain.
    pub fn invoke(
        &self,
        handle: &mut ImageHandle<B>,
        name: &str,
        destination: Option<PathBuf>,
        should_write: bool,
    ) -> Result<Option<PathBuf>> {
        let chain = self.resolve(name)?;
        let mut handle = DestinationOverride::new(handle, destination);

        let result = Self::run_chain(&mut handle, &chain).and_then(|()| {
            if should_write {
                handle.write()
            } else {
                Ok(None)
            }
        });
        if result.is_err() {
            handle.reset();
        }
        result
    }

    fn run_chain(handle: &mut ImageHandle<B>, chain: &[&Version<B>]) -> Result<()> {
        for version in chain {
            if let Some(recipe) = &version.recipe {
                log::debug!("running version '{}'", version.name);
                recipe(&mut *handle)?;
            }
        }
        Ok(())
    }
}

/// Scoped destination override, undone on drop.
struct DestinationOverride<'h, B: ImageBackend> {
    handle: &'h mut ImageHandle<B>,
    previous: Option<PathBuf>,
}

impl<'h, B: ImageBackend> DestinationOverride<'h, B> {
    fn new(handle: &'h mut ImageHandle<B>, destination: Option<PathBuf>) -> Self {
        let previous = destination.map(|dst| handle.replace_destination(dst));
        Self { handle, previous }
    }
}

impl<B: ImageBackend> Deref for DestinationOverride<'_, B> {
    type Target = ImageHandle<B>;

    fn deref(&self) -> &Self::Target {
        self.handle
    }
}

impl<B: ImageBackend> DerefMut for DestinationOverride<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.handle
    }
}

impl<B: ImageBackend> Drop for DestinationOverride<'_, B> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.handle.replace_destination(previous);
        }
    }
}
