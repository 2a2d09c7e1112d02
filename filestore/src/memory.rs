use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::error::FileError;
use crate::store::ImageStore;

/// In-memory [`ImageStore`] backed by a path-keyed map.
/// Directories exist implicitly through the files inside them.
/// Intended for tests and ephemeral use.
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}

impl ImageStore for MemoryStore {
    fn list_files(&self, dir: &str) -> Result<Vec<String>, FileError> {
        let files = self.files.lock().expect("lock poisoned");
        let names: Vec<String> = files
            .keys()
            .filter_map(|path| {
                let (parent, name) = split_parent(path);
                (parent == dir).then(|| name.to_string())
            })
            .collect();
        Ok(names)
    }

    fn list_dirs(&self, dir: &str) -> Result<Vec<String>, FileError> {
        let files = self.files.lock().expect("lock poisoned");
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        let mut dirs = BTreeSet::new();
        for path in files.keys() {
            if let Some(rest) = path.strip_prefix(&prefix) {
                if let Some((first, _)) = rest.split_once('/') {
                    dirs.insert(first.to_string());
                }
            }
        }
        Ok(dirs.into_iter().collect())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, FileError> {
        let files = self.files.lock().expect("lock poisoned");
        files
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), FileError> {
        let mut files = self.files.lock().expect("lock poisoned");
        files.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let files = self.files.lock().expect("lock poisoned");
        files.contains_key(path)
    }

    fn remove(&self, path: &str) -> Result<(), FileError> {
        let mut files = self.files.lock().expect("lock poisoned");
        files.remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_files_is_scoped_to_one_level() {
        let store = MemoryStore::new();
        store.write("a.jpg", b"1").unwrap();
        store.write("S1/front.jpg", b"2").unwrap();
        store.write("S1/left.jpg", b"3").unwrap();
        store.write("CSE/A/S2/front.jpg", b"4").unwrap();

        assert_eq!(store.list_files("").unwrap(), vec!["a.jpg"]);
        assert_eq!(
            store.list_files("S1").unwrap(),
            vec!["front.jpg", "left.jpg"]
        );
        assert_eq!(store.list_files("CSE").unwrap(), Vec::<String>::new());
        assert_eq!(store.list_files("missing").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn list_dirs_walks_one_level() {
        let store = MemoryStore::new();
        store.write("S1/front.jpg", b"1").unwrap();
        store.write("CSE/A/S2/front.jpg", b"2").unwrap();
        store.write("CSE/B/S3/front.jpg", b"3").unwrap();

        assert_eq!(store.list_dirs("").unwrap(), vec!["CSE", "S1"]);
        assert_eq!(store.list_dirs("CSE").unwrap(), vec!["A", "B"]);
        assert_eq!(store.list_dirs("CSE/A").unwrap(), vec!["S2"]);
    }

    #[test]
    fn read_write_remove() {
        let store = MemoryStore::new();
        store.write("S1/front.jpg", b"bytes").unwrap();
        assert!(store.exists("S1/front.jpg"));
        assert_eq!(store.read("S1/front.jpg").unwrap(), b"bytes");

        store.remove("S1/front.jpg").unwrap();
        assert!(!store.exists("S1/front.jpg"));
        assert!(matches!(
            store.read("S1/front.jpg"),
            Err(FileError::NotFound(_))
        ));

        // Removing a missing file is not an error.
        store.remove("S1/front.jpg").unwrap();
    }
}
