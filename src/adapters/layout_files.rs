//! Layout storage adapters.
//!
//! Implements [`LayoutStore`] twice:
//!
//! - [`FileLayoutStore`]: one pretty-printed JSON file per layout in a
//!   directory. Writes land in a temp file first and are renamed into
//!   place so a power cut never leaves half a layout behind.
//! - [`MemoryLayoutStore`]: the same JSON round-trip kept in a map, for
//!   tests and for running without a writable disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::layout::Layout;
use crate::app::ports::{LayoutError, LayoutStore};

const EXTENSION: &str = "json";

pub struct FileLayoutStore {
    dir: PathBuf,
}

impl FileLayoutStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LayoutError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, &e))?;
        info!("FileLayoutStore: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{EXTENSION}"))
    }
}

fn io_err(path: &Path, e: &std::io::Error) -> LayoutError {
    LayoutError::Io(format!("{}: {}", path.display(), e))
}

impl LayoutStore for FileLayoutStore {
    fn save(&mut self, name: &str, layout: &Layout) -> Result<(), LayoutError> {
        let path = self.path(name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, layout.to_json()?).map_err(|e| io_err(&tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, &e))
    }

    fn load(&self, name: &str) -> Result<Layout, LayoutError> {
        let path = self.path(name);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LayoutError::NotFound(name.to_string()),
            _ => io_err(&path, &e),
        })?;
        Layout::from_json(&text)
    }

    fn delete(&mut self, name: &str) -> Result<bool, LayoutError> {
        let path = self.path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(&path, &e)),
        }
    }

    fn list(&self) -> Result<Vec<String>, LayoutError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| io_err(&self.dir, &e))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == EXTENSION))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }
}

// ── In-memory backend ─────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    layouts: BTreeMap<String, String>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn save(&mut self, name: &str, layout: &Layout) -> Result<(), LayoutError> {
        self.layouts.insert(name.to_string(), layout.to_json()?);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Layout, LayoutError> {
        let text = self
            .layouts
            .get(name)
            .ok_or_else(|| LayoutError::NotFound(name.to_string()))?;
        Layout::from_json(text)
    }

    fn delete(&mut self, name: &str) -> Result<bool, LayoutError> {
        Ok(self.layouts.remove(name).is_some())
    }

    fn list(&self) -> Result<Vec<String>, LayoutError> {
        Ok(self.layouts.keys().cloned().collect())
    }
}
