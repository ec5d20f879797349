//! Partial registry for file-based and inline partials.
//!
//! [`PartialRegistry`] collects partial templates from inline strings and
//! template directories, then hands them to rendering as a flat
//! [`Partials`] map.
//!
//! # Resolution
//!
//! 1. Inline partials (added via [`PartialRegistry::add_inline`]) win.
//! 2. File partials are found by their path relative to the directory they
//!    were loaded from, with or without extension: both `"users/row"` and
//!    `"users/row.mustache"` resolve.
//!
//! # Supported Extensions
//!
//! | Priority | Extension |
//! |----------|-----------|
//! | 1 (highest) | `.mustache` |
//! | 2 | `.hbs` |
//! | 3 (lowest) | `.txt` |
//!
//! When one directory holds `row.mustache` and `row.txt`, `"row"` resolves
//! to `row.mustache`. The same name coming from two different directories is
//! a [`RegistryError::Collision`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mustang::{PartialRegistry, Renderer};
//!
//! let mut registry = PartialRegistry::new();
//! registry.add_template_dir("./partials")?;
//! registry.add_inline("footer", "-- {{site}}");
//!
//! let renderer = Renderer::new().with_registry(&registry)?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::interpreter::Partials;

/// Recognized partial file extensions in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".mustache", ".hbs", ".txt"];

/// A partial file discovered during directory walking.
///
/// For a file at `/app/partials/users/row.mustache` with root `/app/partials`:
///
/// ```rust,ignore
/// TemplateFile {
///     name: "users/row".to_string(),
///     name_with_ext: "users/row.mustache".to_string(),
///     absolute_path: PathBuf::from("/app/partials/users/row.mustache"),
///     source_dir: PathBuf::from("/app/partials"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Resolution name without extension (e.g., "row" or "users/row")
    pub name: String,
    /// Resolution name with extension (e.g., "users/row.mustache")
    pub name_with_ext: String,
    /// Absolute path to the file
    pub absolute_path: PathBuf,
    /// The directory root this file was found under
    pub source_dir: PathBuf,
}

impl TemplateFile {
    /// Creates a new file descriptor.
    pub fn new(
        name: impl Into<String>,
        name_with_ext: impl Into<String>,
        absolute_path: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            name_with_ext: name_with_ext.into(),
            absolute_path: absolute_path.into(),
            source_dir: source_dir.into(),
        }
    }

    /// Returns the extension priority (lower is higher priority).
    ///
    /// Returns `usize::MAX` if the extension is not recognized.
    pub fn extension_priority(&self) -> usize {
        TEMPLATE_EXTENSIONS
            .iter()
            .position(|ext| self.name_with_ext.ends_with(ext))
            .unwrap_or(usize::MAX)
    }
}

/// Error type for partial registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two directories contain files that resolve to the same name.
    #[error(
        "Partial collision detected for \"{name}\":\n  - {} (from {})\n  - {} (from {})",
        .existing_path.display(),
        .existing_dir.display(),
        .conflicting_path.display(),
        .conflicting_dir.display()
    )]
    Collision {
        /// The name that has conflicting sources
        name: String,
        /// Path to the file registered first
        existing_path: PathBuf,
        /// Directory the first file came from
        existing_dir: PathBuf,
        /// Path to the conflicting file
        conflicting_path: PathBuf,
        /// Directory the conflicting file came from
        conflicting_dir: PathBuf,
    },

    /// No partial is registered under the name.
    #[error("Partial not found: \"{name}\"")]
    NotFound {
        /// The name that was requested
        name: String,
    },

    /// A file or directory could not be read.
    #[error("Failed to read \"{}\": {message}", .path.display())]
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// Error message
        message: String,
    },
}

/// Registry of named partials from inline strings and directories.
#[derive(Debug, Default, Clone)]
pub struct PartialRegistry {
    inline: HashMap<String, String>,
    files: HashMap<String, PathBuf>,
    /// Base name to (path, source dir), for collision reporting.
    sources: HashMap<String, (PathBuf, PathBuf)>,
}

impl PartialRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inline partial, replacing any earlier one with the same name.
    pub fn add_inline(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.inline.insert(name.into(), content.into());
    }

    /// Adds every partial file under `path`, recursively.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReadError`] if the directory cannot be walked
    /// and [`RegistryError::Collision`] if a name is already taken by a file
    /// from another directory.
    pub fn add_template_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<(), RegistryError> {
        let files = walk_template_dir(path)?;
        debug!(count = files.len(), "registering partial files");
        self.add_from_files(files)
    }

    /// Registers discovered files under their names with and without
    /// extension.
    ///
    /// Files are processed in extension priority order, so the extensionless
    /// name goes to the highest-priority file of a directory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Collision`] if files from different
    /// directories resolve to the same name.
    pub fn add_from_files(&mut self, files: Vec<TemplateFile>) -> Result<(), RegistryError> {
        let mut sorted_files = files;
        sorted_files.sort_by_key(|f| f.extension_priority());

        for file in sorted_files {
            if let Some((existing_path, existing_dir)) = self.sources.get(&file.name) {
                if existing_dir != &file.source_dir {
                    return Err(RegistryError::Collision {
                        name: file.name.clone(),
                        existing_path: existing_path.clone(),
                        existing_dir: existing_dir.clone(),
                        conflicting_path: file.absolute_path.clone(),
                        conflicting_dir: file.source_dir.clone(),
                    });
                }
                // lower-priority extension from the same directory
                self.files
                    .insert(file.name_with_ext.clone(), file.absolute_path);
                continue;
            }

            self.sources.insert(
                file.name.clone(),
                (file.absolute_path.clone(), file.source_dir.clone()),
            );
            self.files
                .insert(file.name.clone(), file.absolute_path.clone());
            self.files.insert(file.name_with_ext, file.absolute_path);
        }

        Ok(())
    }

    /// Gets the content of a partial, reading from disk if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the partial is not registered or its file cannot
    /// be read.
    pub fn get_content(&self, name: &str) -> Result<String, RegistryError> {
        if let Some(content) = self.inline.get(name) {
            return Ok(content.clone());
        }

        let path = self.files.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })?;
        read_file(path)
    }

    /// Returns true if `name` resolves to a partial.
    pub fn contains(&self, name: &str) -> bool {
        self.inline.contains_key(name) || self.files.contains_key(name)
    }

    /// Returns the number of registered names.
    ///
    /// File partials count twice: once with and once without extension.
    pub fn len(&self) -> usize {
        self.names().count()
    }

    /// Returns true if no partials are registered.
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.files.is_empty()
    }

    /// Returns an iterator over all registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inline.keys().map(String::as_str).chain(
            self.files
                .keys()
                .filter(|name| !self.inline.contains_key(*name))
                .map(String::as_str),
        )
    }

    /// Reads every partial into a map rendering can use directly.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ReadError`] if any file cannot be read.
    pub fn to_partials(&self) -> Result<Partials, RegistryError> {
        let mut partials = Partials::with_capacity(self.files.len() + self.inline.len());
        for (name, path) in &self.files {
            partials.insert(name.clone(), read_file(path)?);
        }
        for (name, content) in &self.inline {
            partials.insert(name.clone(), content.clone());
        }
        Ok(partials)
    }
}

fn read_file(path: &Path) -> Result<String, RegistryError> {
    std::fs::read_to_string(path).map_err(|e| RegistryError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Walks a directory recursively and returns every file with a recognized
/// extension.
///
/// Names use forward slashes on every platform. The result is not sorted.
///
/// # Errors
///
/// Returns [`RegistryError::ReadError`] if the directory cannot be read.
pub fn walk_template_dir(root: impl AsRef<Path>) -> Result<Vec<TemplateFile>, RegistryError> {
    let root = root.as_ref();
    let root_canonical = root.canonicalize().map_err(|e| RegistryError::ReadError {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    walk_dir_recursive(&root_canonical, &root_canonical, &mut files)?;
    Ok(files)
}

fn walk_dir_recursive(
    current: &Path,
    root: &Path,
    files: &mut Vec<TemplateFile>,
) -> Result<(), RegistryError> {
    let read_error = |e: std::io::Error| RegistryError::ReadError {
        path: current.to_path_buf(),
        message: e.to_string(),
    };

    for entry in std::fs::read_dir(current).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();

        if path.is_dir() {
            walk_dir_recursive(&path, root, files)?;
        } else if path.is_file() {
            if let Some(file) = try_parse_file(&path, root) {
                files.push(file);
            }
        }
    }

    Ok(())
}

/// Returns `None` if the file doesn't have a recognized extension.
fn try_parse_file(path: &Path, root: &Path) -> Option<TemplateFile> {
    let path_str = path.to_string_lossy();
    let extension = TEMPLATE_EXTENSIONS
        .iter()
        .find(|ext| path_str.ends_with(*ext))?;

    let relative = path.strip_prefix(root).ok()?;
    let name_with_ext = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let name = name_with_ext.strip_suffix(extension)?.to_string();

    Some(TemplateFile::new(name, name_with_ext, path, root))
}
