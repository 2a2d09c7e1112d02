use std::sync::Arc;

use tracing::warn;

use faceguard_enroll::{CandidateImage, EnrollConfig, Enroller, PendingReport};
use faceguard_extract::FaceExtractor;
use faceguard_filestore::ImageStore;
use faceguard_matcher::{
    CommitResult, ConfirmRequest, IdentityIndex, MatchEngine, MatchQuery, MatchResult,
};
use faceguard_reconcile::{Reconciler, ReconcilerConfig, SweepReport};
use faceguard_store::{Identity, IdentityStore, ViolationLedger};

use crate::config::Config;
use crate::error::HostError;

/// Configures a [`Host`].
pub struct HostConfig {
    /// Enrollment and matching policy.
    pub policy: Config,

    /// Embedding extractor. Required; constructed and owned by the caller
    /// rather than loaded lazily behind the scenes.
    pub extractor: Arc<dyn FaceExtractor>,

    /// Identity document store. Required.
    pub store: Arc<dyn IdentityStore>,

    /// Image tree. Required.
    pub images: Arc<dyn ImageStore>,

    /// Violation ledger consumed by confirm. Required.
    pub ledger: Arc<dyn ViolationLedger>,

    /// Separate tree for probe capture audit. Optional; kept apart from
    /// `images` so the reconciler never mistakes captures for enrollment
    /// photos.
    pub captures: Option<Arc<dyn ImageStore>>,

    /// Reconciler policy (segment allow-lists).
    pub reconcile: ReconcilerConfig,
}

/// Process-level entry point wiring the enrollment engine, the storage
/// reconciler and the match engine around one shared identity index.
/// Safe for concurrent use.
pub struct Host {
    config: Config,
    extractor: Arc<dyn FaceExtractor>,
    store: Arc<dyn IdentityStore>,
    captures: Option<Arc<dyn ImageStore>>,
    enroller: Enroller,
    reconciler: Reconciler,
    index: Arc<IdentityIndex>,
    engine: MatchEngine,
}

impl Host {
    /// Create a new Host. Validates the extractor's dimension against the
    /// configured one and builds the initial index from the store.
    pub fn new(cfg: HostConfig) -> Result<Self, HostError> {
        let config = cfg.policy.with_defaults();

        if cfg.extractor.dimension() != config.dimension {
            return Err(HostError::ExtractorDimensionMismatch {
                extractor: cfg.extractor.dimension(),
                configured: config.dimension,
            });
        }

        let enroller = Enroller::new(
            EnrollConfig {
                min_valid_images: config.min_valid_images,
            },
            cfg.extractor.clone(),
            cfg.store.clone(),
            cfg.images.clone(),
        );
        let reconciler = Reconciler::new(cfg.reconcile, cfg.store.clone(), cfg.images.clone());

        let index = Arc::new(IdentityIndex::new(config.dimension));
        index.rebuild(cfg.store.as_ref())?;
        let engine = MatchEngine::new(index.clone(), cfg.store.clone(), cfg.ledger);

        Ok(Self {
            config,
            extractor: cfg.extractor,
            store: cfg.store,
            captures: cfg.captures,
            enroller,
            reconciler,
            index,
            engine,
        })
    }

    /// Enroll a new identity from candidate images and refresh the index.
    pub fn register(
        &self,
        identity_id: &str,
        name: &str,
        group_path: &[String],
        images: &[CandidateImage],
    ) -> Result<Identity, HostError> {
        let identity = self.enroller.register(identity_id, name, group_path, images)?;
        self.index.rebuild(self.store.as_ref())?;
        Ok(identity)
    }

    /// Replace an identity's vector and image set wholesale and refresh
    /// the index.
    pub fn reenroll(
        &self,
        identity_id: &str,
        images: &[CandidateImage],
    ) -> Result<Identity, HostError> {
        let identity = self.enroller.reenroll(identity_id, images)?;
        self.index.rebuild(self.store.as_ref())?;
        Ok(identity)
    }

    /// Derive vectors for every pending identity with discoverable images.
    pub fn enroll_pending(&self) -> Result<PendingReport, HostError> {
        let report = self.enroller.enroll_pending()?;
        if report.activated > 0 {
            self.index.rebuild(self.store.as_ref())?;
        }
        Ok(report)
    }

    /// Reconcile records with the image tree, refreshing the index if
    /// anything moved. Safe to call at startup, on demand or periodically.
    pub fn sync(&self) -> Result<SweepReport, HostError> {
        let report = self.reconciler.sweep()?;
        if !report.is_noop() {
            self.index.rebuild(self.store.as_ref())?;
        }
        Ok(report)
    }

    /// Answer "who is this probe image" against the enrolled population,
    /// optionally restricted to a group-path prefix. Read-only: repeated
    /// calls for one physical event are free, only [`Host::confirm`]
    /// commits anything.
    ///
    /// A probe the extractor rejects surfaces as
    /// [`HostError::ProbeRejected`], so callers can tell "retake the
    /// photo" apart from "this person isn't enrolled".
    pub fn identify(&self, probe: &[u8], scope: &[String]) -> Result<MatchResult, HostError> {
        self.audit_capture(probe);

        let vector = self
            .extractor
            .extract(probe)
            .map_err(HostError::ProbeRejected)?;

        let result = self.engine.propose(&MatchQuery {
            vector,
            scope: scope.to_vec(),
            threshold: self.config.threshold,
        })?;
        Ok(result)
    }

    /// Commit one confirmed violation: one ledger record, one counter
    /// increment. Callers invoke this exactly once per accepted event.
    pub fn confirm(
        &self,
        identity_id: &str,
        request: &ConfirmRequest,
    ) -> Result<CommitResult, HostError> {
        Ok(self.engine.confirm(identity_id, request)?)
    }

    /// Fetch one identity record.
    pub fn identity(&self, identity_id: &str) -> Result<Option<Identity>, HostError> {
        Ok(self.store.get(identity_id)?)
    }

    /// Number of identities currently searchable.
    pub fn indexed(&self) -> usize {
        self.index.len()
    }

    /// Force an index rebuild from the store.
    pub fn rebuild_index(&self) -> Result<usize, HostError> {
        Ok(self.index.rebuild(self.store.as_ref())?)
    }

    /// Persist the probe bytes for audit when a capture store is
    /// configured. Best effort; a failed write never fails the match.
    fn audit_capture(&self, probe: &[u8]) {
        let Some(captures) = self.captures.as_ref() else {
            return;
        };
        let name = format!(
            "capture_{}_{}.jpg",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4()
        );
        if let Err(e) = captures.write(&name, probe) {
            warn!("capture audit write failed: {e}");
        }
    }
}
