use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use faceguard_filestore::{ImageStore, StorageLayout, is_image_file, join, layout};
use faceguard_store::{Identity, IdentityStore, normalize_id};

use crate::error::ReconcileError;

/// Controls a [`Reconciler`].
#[derive(Debug, Clone, Default)]
pub struct ReconcilerConfig {
    /// Optional allow-list of group segments per hierarchy level (e.g.
    /// departments at level 0, sections at level 1). An empty list at a
    /// level allows anything; directories failing the list are skipped
    /// with a warning, never scanned.
    pub allowed_segments: Vec<Vec<String>>,
}

impl ReconcilerConfig {
    fn normalized(mut self) -> Self {
        for level in &mut self.allowed_segments {
            for segment in level.iter_mut() {
                *segment = normalize_id(segment);
            }
        }
        self
    }
}

/// Outcome counts of one [`Reconciler::sweep`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Orphan file sets registered as new pending identities.
    pub created: usize,
    /// Records whose bookkeeping was refreshed without a status change.
    pub updated: usize,
    /// Active identities returned to pending for re-derivation.
    pub demoted: usize,
    /// Records needing no write at all.
    pub unchanged: usize,
    /// Paths that fit no known layout or failed the segment allow-list.
    pub skipped: usize,
}

impl SweepReport {
    /// True when the sweep wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.demoted == 0
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} demoted, {} unchanged, {} skipped",
            self.created, self.updated, self.demoted, self.unchanged, self.skipped
        )
    }
}

/// Walks the image tree and the identity records and repairs drift in the
/// record bookkeeping. Safe to re-run at any time; a sweep over an
/// unchanged tree writes nothing.
///
/// The tree is expected to use canonical (uppercase) names for identity
/// and group directories; enrollment writes them that way.
pub struct Reconciler {
    config: ReconcilerConfig,
    store: Arc<dyn IdentityStore>,
    images: Arc<dyn ImageStore>,
}

impl Reconciler {
    pub fn new(
        config: ReconcilerConfig,
        store: Arc<dyn IdentityStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            config: config.normalized(),
            store,
            images,
        }
    }

    /// Run one full reconciliation pass: re-resolve every known identity,
    /// then register orphan files as pending identities. Per-path problems
    /// are logged and skipped; only store/storage infrastructure failures
    /// abort the sweep.
    pub fn sweep(&self) -> Result<SweepReport, ReconcileError> {
        let mut report = SweepReport::default();
        self.sync_known(&mut report)?;
        self.discover_orphans(&mut report)?;
        info!("reconcile sweep: {report}");
        Ok(report)
    }

    fn sync_known(&self, report: &mut SweepReport) -> Result<(), ReconcileError> {
        for id in self.store.list_ids()? {
            let Some(mut identity) = self.store.get(&id)? else {
                continue;
            };

            match layout::resolve(self.images.as_ref(), &identity.group_path, &id)? {
                None => {
                    let blank = identity.vector.is_none()
                        && identity.source_images.is_empty()
                        && identity.layout.is_none()
                        && !identity.is_active();
                    if blank {
                        report.unchanged += 1;
                        continue;
                    }
                    let was_active = identity.is_active();
                    if was_active {
                        warn!("{id}: backing images vanished, returning to pending");
                    } else {
                        debug!("{id}: cleared stale bookkeeping, no images on disk");
                    }
                    identity.source_images.clear();
                    identity.layout = None;
                    identity.demote();
                    self.store.upsert(&identity)?;
                    if was_active {
                        report.demoted += 1;
                    } else {
                        report.updated += 1;
                    }
                }
                Some(resolved) => {
                    let files_match = identity.source_images == resolved.files;
                    let layout_match = identity.layout == Some(resolved.layout);

                    if files_match && layout_match {
                        report.unchanged += 1;
                    } else if files_match {
                        // Same files, stale or missing layout tag.
                        identity.layout = Some(resolved.layout);
                        identity.updated_at = chrono::Utc::now();
                        self.store.upsert(&identity)?;
                        report.updated += 1;
                    } else if identity.is_active() {
                        // The stored vector no longer corresponds 1:1 with
                        // the discovered set. Recomputation is the
                        // enrollment engine's job; here only the
                        // bookkeeping moves.
                        warn!(
                            "{id}: image set drifted ({} recorded, {} on disk), scheduling re-enrollment",
                            identity.source_images.len(),
                            resolved.files.len()
                        );
                        identity.source_images = resolved.files;
                        identity.layout = Some(resolved.layout);
                        identity.demote();
                        self.store.upsert(&identity)?;
                        report.demoted += 1;
                    } else {
                        debug!("{id}: refreshed pending bookkeeping");
                        identity.source_images = resolved.files;
                        identity.layout = Some(resolved.layout);
                        identity.updated_at = chrono::Utc::now();
                        self.store.upsert(&identity)?;
                        report.updated += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn discover_orphans(&self, report: &mut SweepReport) -> Result<(), ReconcileError> {
        // Grows as orphans are registered, so one physical identity found
        // through several routes is only created once (first route wins).
        let mut known: BTreeSet<String> = self.store.list_ids()?.into_iter().collect();

        // Loose files in the root: flat and flat-multi orphans.
        let mut orphan_ids = BTreeSet::new();
        for name in self.images.list_files("")? {
            if !is_image_file(&name) {
                continue;
            }
            let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&name);
            if known.contains(&normalize_id(stem)) {
                continue;
            }
            // `<id>_<token>` attributes the file to the id before the last
            // underscore; a stem without one is the id itself.
            let id = match stem.rsplit_once('_') {
                Some((prefix, _)) if !prefix.is_empty() => normalize_id(prefix),
                _ => normalize_id(stem),
            };
            if !known.contains(&id) {
                orphan_ids.insert(id);
            }
        }
        for id in orphan_ids {
            // Re-resolving applies the normal precedence and picks up every
            // sibling file of the same id in one go.
            if let Some(resolved) = layout::resolve(self.images.as_ref(), &[], &id)? {
                self.create_pending(&id, &[], resolved.files, resolved.layout, report)?;
                known.insert(id);
            }
        }

        // Directories: per-identity subdirs and the group hierarchy.
        self.visit_dir("", &[], &mut known, report)
    }

    fn visit_dir(
        &self,
        dir: &str,
        segments: &[String],
        known: &mut BTreeSet<String>,
        report: &mut SweepReport,
    ) -> Result<(), ReconcileError> {
        for sub in self.images.list_dirs(dir)? {
            let path = join(&[dir, &sub]);
            let files: Vec<String> = self
                .images
                .list_files(&path)?
                .into_iter()
                .filter(|name| is_image_file(name))
                .collect();
            let subdirs = self.images.list_dirs(&path)?;

            if !files.is_empty() {
                // A directory holding images is an identity directory; its
                // ancestor chain is the group path.
                if !subdirs.is_empty() {
                    warn!("{path}: nested directories inside an identity directory, ignored");
                }
                let id = normalize_id(&sub);
                if known.contains(&id) {
                    continue;
                }
                let found_layout = if segments.is_empty() {
                    StorageLayout::Subdir
                } else {
                    StorageLayout::Hierarchy
                };
                self.create_pending(&id, segments, files, found_layout, report)?;
                known.insert(id);
            } else if !subdirs.is_empty() {
                // A directory of directories is a group level; gate it on
                // the allow-list for its depth before descending.
                let segment = normalize_id(&sub);
                if let Some(allowed) = self.config.allowed_segments.get(segments.len()) {
                    if !allowed.is_empty() && !allowed.iter().any(|s| s == &segment) {
                        warn!("{path}: segment not in allow-list, skipped");
                        report.skipped += 1;
                        continue;
                    }
                }
                let mut next = segments.to_vec();
                next.push(segment);
                self.visit_dir(&path, &next, known, report)?;
            }
            // Empty directories carry no information; pre-created identity
            // folders show up once files land in them.
        }
        Ok(())
    }

    fn create_pending(
        &self,
        id: &str,
        segments: &[String],
        files: Vec<String>,
        found_layout: StorageLayout,
        report: &mut SweepReport,
    ) -> Result<(), ReconcileError> {
        let mut identity = Identity::new(id, "", segments);
        identity.source_images = files;
        identity.layout = Some(found_layout);
        self.store.upsert(&identity)?;
        info!(
            "{id}: registered pending identity from {} orphan images under {found_layout}",
            identity.source_images.len()
        );
        report.created += 1;
        Ok(())
    }
}
