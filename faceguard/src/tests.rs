use std::sync::Arc;

use crate::{
    Config, ConfirmRequest, ExtractError, FaceStatus, FixedExtractor, Host, HostConfig, HostError,
};
use faceguard_enroll::CandidateImage;
use faceguard_filestore::ImageStore;
use faceguard_store::{IdentityStore, MemoryLedger, TOTAL_COUNTER};

const DIM: usize = 4;

struct Fixture {
    extractor: Arc<FixedExtractor>,
    store: Arc<faceguard_store::MemoryStore>,
    images: Arc<faceguard_filestore::MemoryStore>,
    captures: Arc<faceguard_filestore::MemoryStore>,
    ledger: Arc<MemoryLedger>,
    host: Host,
}

fn fixture(policy: Config) -> Fixture {
    let extractor = Arc::new(FixedExtractor::new(DIM));
    let store = Arc::new(faceguard_store::MemoryStore::new());
    let images = Arc::new(faceguard_filestore::MemoryStore::new());
    let captures = Arc::new(faceguard_filestore::MemoryStore::new());
    let ledger = Arc::new(MemoryLedger::new());

    let host = Host::new(HostConfig {
        policy,
        extractor: extractor.clone(),
        store: store.clone(),
        images: images.clone(),
        ledger: ledger.clone(),
        captures: Some(captures.clone()),
        reconcile: Default::default(),
    })
    .unwrap();

    Fixture {
        extractor,
        store,
        images,
        captures,
        ledger,
        host,
    }
}

fn policy() -> Config {
    Config {
        dimension: DIM,
        min_valid_images: 1,
        threshold: 0.45,
    }
}

#[test]
fn register_identify_confirm_flow() {
    let f = fixture(policy());
    f.extractor.learn(b"alice-front", vec![1.0, 0.0, 0.0, 0.0]);
    f.extractor.learn(b"alice-probe", vec![0.9, 0.1, 0.0, 0.0]);

    f.host
        .register(
            "S1",
            "Alice",
            &[],
            &[CandidateImage::new("front.jpg", b"alice-front")],
        )
        .unwrap();
    assert_eq!(f.host.indexed(), 1);

    // Propose twice; nothing commits until the explicit confirm.
    let first = f.host.identify(b"alice-probe", &[]).unwrap();
    let second = f.host.identify(b"alice-probe", &[]).unwrap();
    assert!(first.accepted);
    assert!(second.accepted);
    assert!(f.ledger.is_empty());

    let best = second.best.unwrap();
    assert_eq!(best.identity_id, "S1");

    let commit = f
        .host
        .confirm(
            &best.identity_id,
            &ConfirmRequest {
                kind: "late_arrival".to_string(),
                location: Some("Gate 2".to_string()),
                idempotency_key: Some("event-1".to_string()),
            },
        )
        .unwrap();

    assert_eq!(commit.total, 1);
    assert_eq!(f.ledger.len(), 1);
    let identity = f.host.identity("S1").unwrap().unwrap();
    assert_eq!(identity.counter(TOTAL_COUNTER), 1);
    assert_eq!(identity.counter("late_arrival"), 1);
}

#[test]
fn probe_rejection_is_distinct_from_no_match() {
    let f = fixture(policy());

    // Unusable probe: retake the photo.
    f.extractor.reject(b"crowd", ExtractError::MultipleFaces);
    let err = f.host.identify(b"crowd", &[]).unwrap_err();
    assert!(matches!(
        err,
        HostError::ProbeRejected(ExtractError::MultipleFaces)
    ));

    // Usable probe, empty population: a normal no-match, not an error.
    f.extractor.learn(b"stranger", vec![0.0; DIM]);
    let result = f.host.identify(b"stranger", &[]).unwrap();
    assert!(!result.accepted);
    assert!(result.best.is_none());
}

#[test]
fn discovered_files_flow_to_matchable_identity() {
    // Files land on disk with no record; sync registers them pending,
    // enroll_pending derives the vector, and the identity turns matchable.
    let f = fixture(policy());
    f.extractor.learn(b"front", vec![0.0, 1.0, 0.0, 0.0]);
    f.extractor.learn(b"left", vec![0.0, 1.0, 0.0, 0.2]);
    f.images.write("CSE/A/S2/front.jpg", b"front").unwrap();
    f.images.write("CSE/A/S2/left.jpg", b"left").unwrap();

    let sweep = f.host.sync().unwrap();
    assert_eq!(sweep.created, 1);
    let identity = f.host.identity("S2").unwrap().unwrap();
    assert_eq!(identity.status, FaceStatus::Pending);
    assert_eq!(identity.group_path, vec!["CSE", "A"]);
    assert_eq!(f.host.indexed(), 0);

    let report = f.host.enroll_pending().unwrap();
    assert_eq!(report.activated, 1);
    assert_eq!(f.host.indexed(), 1);

    f.extractor.learn(b"probe", vec![0.0, 1.0, 0.0, 0.1]);
    let result = f
        .host
        .identify(b"probe", &["CSE".to_string(), "A".to_string()])
        .unwrap();
    assert!(result.accepted);
    assert_eq!(result.best.unwrap().identity_id, "S2");
}

#[test]
fn sync_demotes_when_files_vanish() {
    let f = fixture(policy());
    f.extractor.learn(b"front", vec![1.0, 0.0, 0.0, 0.0]);
    f.host
        .register("S1", "", &[], &[CandidateImage::new("front.jpg", b"front")])
        .unwrap();
    assert_eq!(f.host.indexed(), 1);

    f.images.remove("S1/front.jpg").unwrap();
    let sweep = f.host.sync().unwrap();
    assert_eq!(sweep.demoted, 1);
    assert_eq!(f.host.indexed(), 0, "demoted identities leave the index");

    f.extractor.learn(b"probe", vec![1.0, 0.0, 0.0, 0.0]);
    let result = f.host.identify(b"probe", &[]).unwrap();
    assert!(!result.accepted);
}

#[test]
fn scope_restricts_matching() {
    let f = fixture(policy());
    f.extractor.learn(b"cse", vec![1.0, 0.0, 0.0, 0.0]);
    f.extractor.learn(b"ece", vec![0.0, 1.0, 0.0, 0.0]);

    let cse = vec!["CSE".to_string(), "A".to_string()];
    let ece = vec!["ECE".to_string(), "B".to_string()];
    f.host
        .register("S1", "", &cse, &[CandidateImage::new("f.jpg", b"cse")])
        .unwrap();
    f.host
        .register("S2", "", &ece, &[CandidateImage::new("f.jpg", b"ece")])
        .unwrap();

    f.extractor.learn(b"probe", vec![0.0, 1.0, 0.0, 0.0]);
    let unscoped = f.host.identify(b"probe", &[]).unwrap();
    assert_eq!(unscoped.best.unwrap().identity_id, "S2");

    let scoped = f.host.identify(b"probe", &["CSE".to_string()]).unwrap();
    assert!(!scoped.accepted, "S2 is out of scope, S1 is too far");
    assert_eq!(scoped.best.unwrap().identity_id, "S1");
}

#[test]
fn reenroll_moves_the_match() {
    let f = fixture(policy());
    f.extractor.learn(b"old", vec![1.0, 0.0, 0.0, 0.0]);
    f.host
        .register("S1", "", &[], &[CandidateImage::new("old.jpg", b"old")])
        .unwrap();

    f.extractor.learn(b"new", vec![0.0, 0.0, 1.0, 0.0]);
    f.host
        .reenroll("S1", &[CandidateImage::new("new.jpg", b"new")])
        .unwrap();

    f.extractor.learn(b"probe", vec![0.0, 0.0, 1.0, 0.0]);
    let result = f.host.identify(b"probe", &[]).unwrap();
    let best = result.best.unwrap();
    assert!(result.accepted);
    assert_eq!(best.identity_id, "S1");
    assert_eq!(best.distance, 0.0, "only the new vector backs the identity");
}

#[test]
fn capture_audit_writes_one_file_per_identify() {
    let f = fixture(policy());
    f.extractor.learn(b"probe", vec![0.0; DIM]);

    f.host.identify(b"probe", &[]).unwrap();
    assert_eq!(f.captures.list_files("").unwrap().len(), 1);

    f.host.identify(b"probe", &[]).unwrap();
    assert_eq!(f.captures.list_files("").unwrap().len(), 2);

    // Captures never leak into the enrollment tree.
    assert!(f.images.list_files("").unwrap().is_empty());
    assert_eq!(f.store.list_ids().unwrap().len(), 0);
}

#[test]
fn extractor_dimension_must_match_config() {
    let err = Host::new(HostConfig {
        policy: Config {
            dimension: 128,
            ..Config::default()
        },
        extractor: Arc::new(FixedExtractor::new(64)),
        store: Arc::new(faceguard_store::MemoryStore::new()),
        images: Arc::new(faceguard_filestore::MemoryStore::new()),
        ledger: Arc::new(MemoryLedger::new()),
        captures: None,
        reconcile: Default::default(),
    })
    .unwrap_err();

    assert!(matches!(
        err,
        HostError::ExtractorDimensionMismatch {
            extractor: 64,
            configured: 128
        }
    ));
}

#[test]
fn threshold_is_policy_not_constant() {
    let strict = fixture(Config {
        threshold: 0.05,
        ..policy()
    });
    strict.extractor.learn(b"enrolled", vec![0.0; DIM]);
    strict
        .host
        .register("S1", "", &[], &[CandidateImage::new("f.jpg", b"enrolled")])
        .unwrap();

    strict.extractor.learn(b"probe", vec![0.1, 0.0, 0.0, 0.0]);
    let result = strict.host.identify(b"probe", &[]).unwrap();
    assert!(!result.accepted, "0.1 away fails a 0.05 threshold");
    let best = result.best.unwrap();
    assert!((best.distance - 0.1).abs() < 1e-6);
}

#[test]
fn index_rebuild_survives_restart_shape() {
    // A fresh Host over an already-populated store starts with a full
    // index, the way a restarted process would.
    let f = fixture(policy());
    f.extractor.learn(b"front", vec![1.0, 0.0, 0.0, 0.0]);
    f.host
        .register("S1", "", &[], &[CandidateImage::new("front.jpg", b"front")])
        .unwrap();

    let revived = Host::new(HostConfig {
        policy: policy(),
        extractor: f.extractor.clone(),
        store: f.store.clone(),
        images: f.images.clone(),
        ledger: f.ledger.clone(),
        captures: None,
        reconcile: Default::default(),
    })
    .unwrap();
    assert_eq!(revived.indexed(), 1);
}
