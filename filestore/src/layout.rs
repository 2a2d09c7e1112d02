//! Layout strategies for locating an identity's enrollment images.
//!
//! Four layouts have been used over the life of the system:
//!
//! - `Hierarchy`: `<group_1>/.../<identity_id>/<file>.<ext>`
//! - `Subdir`:    `<identity_id>/<file>.<ext>`
//! - `FlatMulti`: `<identity_id>_<token>.<ext>` in the root
//! - `Flat`:      `<identity_id>.<ext>` in the root
//!
//! [`resolve`] tries them in that order and returns the first that yields
//! at least one image, so the most specific layout wins when several match.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FileError;
use crate::store::{ImageStore, join};

/// File extensions accepted as enrollment images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Returns true for filenames with an accepted image extension.
pub fn is_image_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        None => false,
    }
}

/// Tagged layout an identity's files were resolved under. Persisted on the
/// identity record so migrations are explicit data, not guessed from names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageLayout {
    Flat,
    FlatMulti,
    Subdir,
    Hierarchy,
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "flat"),
            Self::FlatMulti => write!(f, "flat_multi"),
            Self::Subdir => write!(f, "subdir"),
            Self::Hierarchy => write!(f, "hierarchy"),
        }
    }
}

/// Outcome of [`resolve`]: where an identity's images live and what they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImages {
    pub layout: StorageLayout,
    /// Directory holding the files, relative to the root. Empty for the
    /// flat layouts.
    pub dir: String,
    /// Sorted image file names inside `dir`.
    pub files: Vec<String>,
}

impl ResolvedImages {
    /// Full relative path of one resolved file.
    pub fn path_of(&self, file: &str) -> String {
        join(&[&self.dir, file])
    }
}

/// Locate the images backing `identity_id` under the supported layouts, in
/// fixed precedence order Hierarchy > Subdir > FlatMulti > Flat. Returns
/// `None` when no layout yields a file.
pub fn resolve(
    store: &dyn ImageStore,
    group_path: &[String],
    identity_id: &str,
) -> Result<Option<ResolvedImages>, FileError> {
    if !group_path.is_empty() {
        let segments: Vec<&str> = group_path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(identity_id))
            .collect();
        let dir = join(&segments);
        let files = images_in(store, &dir)?;
        if !files.is_empty() {
            return Ok(Some(ResolvedImages {
                layout: StorageLayout::Hierarchy,
                dir,
                files,
            }));
        }
    }

    let files = images_in(store, identity_id)?;
    if !files.is_empty() {
        return Ok(Some(ResolvedImages {
            layout: StorageLayout::Subdir,
            dir: identity_id.to_string(),
            files,
        }));
    }

    let prefix = format!("{identity_id}_");
    let files: Vec<String> = store
        .list_files("")?
        .into_iter()
        .filter(|name| name.starts_with(&prefix) && is_image_file(name))
        .collect();
    if !files.is_empty() {
        return Ok(Some(ResolvedImages {
            layout: StorageLayout::FlatMulti,
            dir: String::new(),
            files,
        }));
    }

    let mut files: Vec<String> = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("{identity_id}.{ext}"))
        .filter(|name| store.exists(name))
        .collect();
    files.sort();
    if !files.is_empty() {
        return Ok(Some(ResolvedImages {
            layout: StorageLayout::Flat,
            dir: String::new(),
            files,
        }));
    }

    Ok(None)
}

/// Directory new enrollments are written to: the group hierarchy when the
/// identity is scoped, a plain per-identity subdirectory otherwise.
pub fn target_dir(group_path: &[String], identity_id: &str) -> (StorageLayout, String) {
    if group_path.is_empty() {
        (StorageLayout::Subdir, identity_id.to_string())
    } else {
        let segments: Vec<&str> = group_path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(identity_id))
            .collect();
        (StorageLayout::Hierarchy, join(&segments))
    }
}

fn images_in(store: &dyn ImageStore, dir: &str) -> Result<Vec<String>, FileError> {
    Ok(store
        .list_files(dir)?
        .into_iter()
        .filter(|name| is_image_file(name))
        .collect())
}
