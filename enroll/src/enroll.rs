use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use faceguard_extract::FaceExtractor;
use faceguard_filestore::{ImageStore, join, layout};
use faceguard_store::{FaceStatus, Identity, IdentityFilter, IdentityStore, normalize_group, normalize_id};

use crate::centroid::centroid;
use crate::error::EnrollError;
use crate::locks::IdLocks;

/// One submitted enrollment photo: raw bytes plus the filename it will be
/// stored under. Decided once at the boundary.
#[derive(Debug, Clone)]
pub struct CandidateImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl CandidateImage {
    pub fn new(filename: &str, bytes: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            bytes: bytes.to_vec(),
        }
    }
}

/// Controls the enrollment quality gate.
#[derive(Debug, Clone, Copy)]
pub struct EnrollConfig {
    /// Minimum number of images that must survive the quality gate for an
    /// enrollment to succeed. Deployment policy, floor 1.
    pub min_valid_images: usize,
}

impl EnrollConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.min_valid_images == 0 {
            self.min_valid_images = 1;
        }
        self
    }
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self { min_valid_images: 1 }
    }
}

/// Outcome counts of one [`Enroller::enroll_pending`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingReport {
    /// Identities that transitioned to active.
    pub activated: usize,
    /// Identities whose images failed the quality gate or whose update
    /// failed; they stay pending.
    pub failed: usize,
    /// Identities with no discoverable images; nothing to do yet.
    pub skipped: usize,
}

/// Drives the image quality gate and the averaging policy that turns
/// submitted or discovered photographs into one stored vector per
/// identity. The only component that moves an identity to active.
pub struct Enroller {
    config: EnrollConfig,
    extractor: Arc<dyn FaceExtractor>,
    store: Arc<dyn IdentityStore>,
    images: Arc<dyn ImageStore>,
    locks: IdLocks,
}

impl Enroller {
    pub fn new(
        config: EnrollConfig,
        extractor: Arc<dyn FaceExtractor>,
        store: Arc<dyn IdentityStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            config: config.with_defaults(),
            extractor,
            store,
            images,
            locks: IdLocks::new(),
        }
    }

    /// Enroll a new identity from its candidate images. Fails with
    /// [`EnrollError::DuplicateIdentity`] if the id is already taken;
    /// re-enrollment is a distinct, explicit operation.
    pub fn register(
        &self,
        identity_id: &str,
        name: &str,
        group_path: &[String],
        images: &[CandidateImage],
    ) -> Result<Identity, EnrollError> {
        let id = normalize_id(identity_id);
        let group = normalize_group(group_path);
        let slot = self.locks.acquire(&id);
        let _guard = slot.lock().expect("lock poisoned");

        if self.store.get(&id)?.is_some() {
            return Err(EnrollError::DuplicateIdentity(id));
        }

        let (vector, used) = self.derive(&id, images)?;
        let (target_layout, dir) = layout::target_dir(&group, &id);
        self.write_images(&dir, images, &used)?;

        let mut identity = Identity::new(&id, name, &group);
        identity.vector = Some(vector);
        identity.status = FaceStatus::Active;
        identity.source_images = sorted(used);
        identity.layout = Some(target_layout);
        self.store.upsert(&identity)?;

        info!(
            "enrolled {} from {} of {} images",
            id,
            identity.source_images.len(),
            images.len()
        );
        Ok(identity)
    }

    /// Replace an existing identity's vector and image set wholesale from
    /// a new submission. Nothing from the previous set survives; partial
    /// re-averaging against stale images is not a thing.
    pub fn reenroll(
        &self,
        identity_id: &str,
        images: &[CandidateImage],
    ) -> Result<Identity, EnrollError> {
        let id = normalize_id(identity_id);
        let slot = self.locks.acquire(&id);
        let _guard = slot.lock().expect("lock poisoned");

        let mut identity = self
            .store
            .get(&id)?
            .ok_or_else(|| EnrollError::UnknownIdentity(id.clone()))?;

        // Quality-gate the new submission before touching anything, so a
        // rejected re-enrollment leaves the previous state intact.
        let (vector, used) = self.derive(&id, images)?;

        let previous = layout::resolve(self.images.as_ref(), &identity.group_path, &id)?;
        let (target_layout, dir) = layout::target_dir(&identity.group_path, &id);
        self.write_images(&dir, images, &used)?;

        // Drop files from the previous set that the new one doesn't reuse.
        if let Some(previous) = previous {
            let kept: HashSet<String> = used.iter().map(|f| join(&[&dir, f])).collect();
            for file in &previous.files {
                let path = previous.path_of(file);
                if !kept.contains(&path) {
                    self.images.remove(&path)?;
                }
            }
        }

        identity.vector = Some(vector);
        identity.status = FaceStatus::Active;
        identity.source_images = sorted(used);
        identity.layout = Some(target_layout);
        identity.updated_at = chrono::Utc::now();
        self.store.upsert(&identity)?;

        info!("re-enrolled {} from {} images", id, identity.source_images.len());
        Ok(identity)
    }

    /// Sweep all pending identities and activate the ones whose discovered
    /// images pass the quality gate. Per-identity failures are logged and
    /// counted; the sweep never aborts.
    pub fn enroll_pending(&self) -> Result<PendingReport, EnrollError> {
        let pending = self
            .store
            .find(&IdentityFilter::with_status(FaceStatus::Pending))?;

        let mut report = PendingReport::default();
        for identity in pending {
            match self.activate_from_disk(&identity.identity_id) {
                Ok(true) => report.activated += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!("pending enrollment of {} failed: {}", identity.identity_id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "pending sweep: {} activated, {} failed, {} skipped",
            report.activated, report.failed, report.skipped
        );
        Ok(report)
    }

    /// Derive and store the vector for one pending identity from the files
    /// at its resolved storage location. Returns false when there is
    /// nothing to do (no files, or no longer pending).
    fn activate_from_disk(&self, identity_id: &str) -> Result<bool, EnrollError> {
        let slot = self.locks.acquire(identity_id);
        let _guard = slot.lock().expect("lock poisoned");

        // Re-read under the lock; a concurrent enrollment may have won.
        let Some(mut identity) = self.store.get(identity_id)? else {
            return Ok(false);
        };
        if identity.status != FaceStatus::Pending {
            return Ok(false);
        }

        let Some(resolved) =
            layout::resolve(self.images.as_ref(), &identity.group_path, &identity.identity_id)?
        else {
            return Ok(false);
        };

        let mut candidates = Vec::with_capacity(resolved.files.len());
        for file in &resolved.files {
            candidates.push(CandidateImage {
                filename: file.clone(),
                bytes: self.images.read(&resolved.path_of(file))?,
            });
        }

        let (vector, _used) = self.derive(&identity.identity_id, &candidates)?;

        // The record tracks the files actually on disk here, so the
        // reconciler sees no drift even when some were gated out of the
        // average.
        identity.vector = Some(vector);
        identity.status = FaceStatus::Active;
        identity.source_images = resolved.files.clone();
        identity.layout = Some(resolved.layout);
        identity.updated_at = chrono::Utc::now();
        self.store.upsert(&identity)?;

        info!(
            "activated {} from {} discovered images under {}",
            identity.identity_id,
            identity.source_images.len(),
            resolved.layout
        );
        Ok(true)
    }

    /// Run every image through the extractor and average the survivors.
    /// Returns the centroid and the filenames that contributed to it.
    fn derive(
        &self,
        identity_id: &str,
        images: &[CandidateImage],
    ) -> Result<(Vec<f32>, Vec<String>), EnrollError> {
        let want = self.extractor.dimension();
        let mut vectors = Vec::new();
        let mut used = Vec::new();

        for image in images {
            match self.extractor.extract(&image.bytes) {
                Ok(vector) if vector.len() == want => {
                    vectors.push(vector);
                    used.push(image.filename.clone());
                }
                Ok(vector) => {
                    // Wrong-length vectors are never truncated or padded
                    // into the average.
                    warn!(
                        "{}: embedding dimension mismatch for {}: got {}, want {}; image skipped",
                        identity_id,
                        image.filename,
                        vector.len(),
                        want
                    );
                }
                Err(e) => {
                    warn!("{}: image {} rejected: {}", identity_id, image.filename, e);
                }
            }
        }

        if vectors.len() < self.config.min_valid_images {
            return Err(EnrollError::InsufficientValidImages {
                required: self.config.min_valid_images,
                found: vectors.len(),
            });
        }

        Ok((centroid(&vectors), used))
    }

    fn write_images(
        &self,
        dir: &str,
        images: &[CandidateImage],
        used: &[String],
    ) -> Result<(), EnrollError> {
        let used: HashSet<&str> = used.iter().map(String::as_str).collect();
        for image in images {
            if used.contains(image.filename.as_str()) {
                self.images.write(&join(&[dir, &image.filename]), &image.bytes)?;
            }
        }
        Ok(())
    }
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}
