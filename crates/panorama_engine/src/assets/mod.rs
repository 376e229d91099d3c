//! Asset access
//!
//! The engine reads shader sources, modification times and decoded images
//! through the [`AssetSource`] trait so the frame loop and the resource
//! managers never touch the filesystem directly. [`FsAssetSource`] is the real
//! implementation; [`MemoryAssetSource`] backs tests and headless runs.

pub mod image_loader;

pub use image_loader::{ImageData, PixelFormat};

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset is missing
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Asset exists but could not be decoded
    #[error("Failed to load {path}: {reason}")]
    LoadFailed {
        /// Offending file
        path: String,
        /// Decoder message
        reason: String,
    },

    /// Asset decoded into a layout the engine cannot use
    #[error("Unsupported format in {path}: {detail}")]
    UnsupportedFormat {
        /// Offending file
        path: String,
        /// What was found
        detail: String,
    },

    /// IO error
    #[error("IO error on {path}: {source}")]
    Io {
        /// Offending file
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Read-only access to asset files
pub trait AssetSource {
    /// Read a text file (shader sources)
    fn read_to_string(&self, path: &Path) -> Result<String, AssetError>;

    /// Last modification time of a file or directory
    fn modified(&self, path: &Path) -> Result<SystemTime, AssetError>;

    /// Whether a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether the path names a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Decode an image file
    fn load_image(&self, path: &Path) -> Result<ImageData, AssetError>;
}

/// Filesystem-backed asset source
#[derive(Debug, Default, Clone, Copy)]
pub struct FsAssetSource;

impl FsAssetSource {
    /// Create a filesystem source
    pub const fn new() -> Self {
        Self
    }
}

fn io_error(path: &Path, source: std::io::Error) -> AssetError {
    if source.kind() == std::io::ErrorKind::NotFound {
        AssetError::NotFound(path.display().to_string())
    } else {
        AssetError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl AssetSource for FsAssetSource {
    fn read_to_string(&self, path: &Path) -> Result<String, AssetError> {
        std::fs::read_to_string(path).map_err(|e| io_error(path, e))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, AssetError> {
        std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| io_error(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn load_image(&self, path: &Path) -> Result<ImageData, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }
        ImageData::from_file(path)
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Text(String),
    Image(ImageData),
}

#[derive(Debug, Default)]
struct MemoryStore {
    entries: HashMap<PathBuf, (MemoryEntry, SystemTime)>,
    generation: u64,
}

impl MemoryStore {
    fn next_stamp(&mut self) -> SystemTime {
        self.generation += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(self.generation)
    }
}

/// In-memory asset source
///
/// Clones share storage, so a test can keep a handle and edit files after the
/// source has been handed to the game. Every write bumps a logical timestamp,
/// and a directory's modification time is the newest timestamp below it.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetSource {
    store: Rc<RefCell<MemoryStore>>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

impl MemoryAssetSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a text file
    pub fn insert_text(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let mut store = self.store.borrow_mut();
        let stamp = store.next_stamp();
        store.entries.insert(normalize(path.as_ref()), (MemoryEntry::Text(contents.into()), stamp));
    }

    /// Add or replace an image file
    pub fn insert_image(&self, path: impl AsRef<Path>, image: ImageData) {
        let mut store = self.store.borrow_mut();
        let stamp = store.next_stamp();
        store.entries.insert(normalize(path.as_ref()), (MemoryEntry::Image(image), stamp));
    }

    /// Remove a file
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.store.borrow_mut().entries.remove(&normalize(path.as_ref()));
    }

    fn entry(&self, path: &Path) -> Result<MemoryEntry, AssetError> {
        self.store
            .borrow()
            .entries
            .get(&normalize(path))
            .map(|(entry, _)| entry.clone())
            .ok_or_else(|| AssetError::NotFound(path.display().to_string()))
    }
}

impl AssetSource for MemoryAssetSource {
    fn read_to_string(&self, path: &Path) -> Result<String, AssetError> {
        match self.entry(path)? {
            MemoryEntry::Text(text) => Ok(text),
            MemoryEntry::Image(_) => Err(AssetError::LoadFailed {
                path: path.display().to_string(),
                reason: "not a text file".to_string(),
            }),
        }
    }

    fn modified(&self, path: &Path) -> Result<SystemTime, AssetError> {
        let key = normalize(path);
        let store = self.store.borrow();
        store
            .entries
            .iter()
            .filter(|(entry_path, _)| entry_path.starts_with(&key))
            .map(|(_, (_, stamp))| *stamp)
            .max()
            .ok_or_else(|| AssetError::NotFound(path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        let key = normalize(path);
        self.store.borrow().entries.keys().any(|entry| entry.starts_with(&key))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let key = normalize(path);
        self.store
            .borrow()
            .entries
            .keys()
            .any(|entry| entry != &key && entry.starts_with(&key))
    }

    fn load_image(&self, path: &Path) -> Result<ImageData, AssetError> {
        match self.entry(path)? {
            MemoryEntry::Image(image) => Ok(image),
            MemoryEntry::Text(_) => Err(AssetError::LoadFailed {
                path: path.display().to_string(),
                reason: "not an image".to_string(),
            }),
        }
    }
}
