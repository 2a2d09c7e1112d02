use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FileError;
use crate::store::ImageStore;

/// Filesystem-backed [`ImageStore`] rooted at one directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn full(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        full
    }

    fn list(&self, dir: &str, want_dir: bool) -> Result<Vec<String>, FileError> {
        let entries = match fs::read_dir(self.full(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FileError::Io(e.to_string())),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FileError::Io(e.to_string()))?;
            let file_type = entry.file_type().map_err(|e| FileError::Io(e.to_string()))?;
            if file_type.is_dir() == want_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ImageStore for DiskStore {
    fn list_files(&self, dir: &str) -> Result<Vec<String>, FileError> {
        self.list(dir, false)
    }

    fn list_dirs(&self, dir: &str) -> Result<Vec<String>, FileError> {
        self.list(dir, true)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FileError> {
        match fs::read(self.full(path)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FileError::NotFound(path.to_string()))
            }
            Err(e) => Err(FileError::Io(e.to_string())),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), FileError> {
        let full = self.full(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| FileError::Io(e.to_string()))?;
        }
        fs::write(full, bytes).map_err(|e| FileError::Io(e.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.full(path).is_file()
    }

    fn remove(&self, path: &str) -> Result<(), FileError> {
        match fs::remove_file(self.full(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileError::Io(e.to_string())),
        }
    }
}
