use std::sync::Arc;

use faceguard_store::{
    IdentityStore, TOTAL_COUNTER, Violation, ViolationLedger, normalize_group, normalize_id,
};

use crate::distance::{confidence, euclidean_distance};
use crate::error::MatchError;
use crate::index::IdentityIndex;

/// One probe against the enrolled population.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    /// Extracted probe vector.
    pub vector: Vec<f32>,
    /// Optional group-path prefix restricting the searched population.
    /// Empty means everyone.
    pub scope: Vec<String>,
    /// Accept when the best distance is strictly below this.
    pub threshold: f32,
}

/// Best candidate for a probe, with its diagnostics.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub identity_id: String,
    pub group_path: Vec<String>,
    pub distance: f32,
    pub confidence: f32,
}

/// Outcome of [`MatchEngine::propose`]. Never persisted; committing a
/// violation takes a separate, explicit confirm call.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub accepted: bool,
    /// Best in-scope candidate, if the population was non-empty. Reported
    /// even when rejected, for diagnostics.
    pub best: Option<MatchCandidate>,
}

/// Caller-supplied context for one confirmed violation.
#[derive(Debug, Clone, Default)]
pub struct ConfirmRequest {
    /// Violation kind (e.g. "Late Arrival"); the counter key is derived
    /// from it.
    pub kind: String,
    pub location: Option<String>,
    /// Deduplication key for one physical event, passed through to the
    /// ledger verbatim.
    pub idempotency_key: Option<String>,
}

/// Outcome of a confirm: the appended ledger record and the identity's new
/// total violation count.
#[derive(Debug, Clone)]
pub struct CommitResult {
    pub record_id: String,
    pub total: u64,
}

/// Answers "who is this probe" queries against the index and commits
/// confirmed violations exactly once per explicit confirm call.
pub struct MatchEngine {
    index: Arc<IdentityIndex>,
    store: Arc<dyn IdentityStore>,
    ledger: Arc<dyn ViolationLedger>,
}

impl MatchEngine {
    pub fn new(
        index: Arc<IdentityIndex>,
        store: Arc<dyn IdentityStore>,
        ledger: Arc<dyn ViolationLedger>,
    ) -> Self {
        Self { index, store, ledger }
    }

    /// Nearest-neighbor query against the current snapshot. Read-only: no
    /// counter, index or ledger mutation, so callers may retry freely.
    /// An empty (or fully out-of-scope) population is a normal rejection,
    /// not an error.
    pub fn propose(&self, query: &MatchQuery) -> Result<MatchResult, MatchError> {
        let snapshot = self.index.snapshot();
        if query.vector.len() != snapshot.dimension() {
            return Err(MatchError::DimensionMismatch {
                got: query.vector.len(),
                want: snapshot.dimension(),
            });
        }

        let scope = normalize_group(&query.scope);
        let mut best: Option<(usize, f32)> = None;

        for (i, entry) in snapshot.entries().iter().enumerate() {
            if !scope.is_empty()
                && (entry.group_path.len() < scope.len()
                    || entry.group_path[..scope.len()] != scope[..])
            {
                continue;
            }
            let distance = euclidean_distance(&query.vector, &entry.vector);
            // Strictly-less keeps the first encountered on a tie; entry
            // order is fixed by the snapshot.
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        Ok(match best {
            None => MatchResult {
                accepted: false,
                best: None,
            },
            Some((i, distance)) => {
                let entry = &snapshot.entries()[i];
                MatchResult {
                    accepted: distance < query.threshold,
                    best: Some(MatchCandidate {
                        identity_id: entry.identity_id.clone(),
                        group_path: entry.group_path.clone(),
                        distance,
                        confidence: confidence(distance),
                    }),
                }
            }
        })
    }

    /// Commit one violation for an identity: append one immutable ledger
    /// record and atomically bump the kind counter and the total. The only
    /// side-effecting half of the match protocol; callers invoke it once
    /// per accepted event.
    pub fn confirm(
        &self,
        identity_id: &str,
        request: &ConfirmRequest,
    ) -> Result<CommitResult, MatchError> {
        let id = normalize_id(identity_id);
        if self.store.get(&id)?.is_none() {
            return Err(MatchError::UnknownIdentity(id));
        }

        let record = Violation::new(
            &id,
            &request.kind,
            request.location.clone(),
            request.idempotency_key.clone(),
        );
        let record_id = self.ledger.append(&record)?;

        let key = counter_key(&request.kind);
        if !key.is_empty() && key != TOTAL_COUNTER {
            self.store.increment_counter(&id, &key, 1)?;
        }
        let total = self.store.increment_counter(&id, TOTAL_COUNTER, 1)?;

        Ok(CommitResult { record_id, total })
    }
}

/// Counter key for a violation kind: lowercased, non-alphanumeric runs
/// collapsed to single underscores ("Late Arrival" -> "late_arrival").
fn counter_key(kind: &str) -> String {
    let mut key = String::with_capacity(kind.len());
    let mut gap = false;
    for c in kind.trim().chars() {
        if c.is_alphanumeric() {
            if gap && !key.is_empty() {
                key.push('_');
            }
            gap = false;
            for lower in c.to_lowercase() {
                key.push(lower);
            }
        } else {
            gap = true;
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceguard_store::{FaceStatus, Identity, MemoryLedger, MemoryStore};

    const DIM: usize = 4;

    struct Fixture {
        store: Arc<MemoryStore>,
        ledger: Arc<MemoryLedger>,
        index: Arc<IdentityIndex>,
        engine: MatchEngine,
    }

    fn fixture(population: &[(&str, &[&str], Vec<f32>)]) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        for (id, group, vector) in population {
            let group: Vec<String> = group.iter().map(|s| s.to_string()).collect();
            let mut identity = Identity::new(id, "", &group);
            identity.vector = Some(vector.clone());
            identity.status = FaceStatus::Active;
            store.upsert(&identity).unwrap();
        }
        let ledger = Arc::new(MemoryLedger::new());
        let index = Arc::new(IdentityIndex::new(DIM));
        index.rebuild(store.as_ref()).unwrap();
        let engine = MatchEngine::new(index.clone(), store.clone(), ledger.clone());
        Fixture { store, ledger, index, engine }
    }

    fn query(vector: Vec<f32>, threshold: f32) -> MatchQuery {
        MatchQuery { vector, scope: Vec::new(), threshold }
    }

    #[test]
    fn self_match_is_zero_distance() {
        let v = vec![0.3, -0.1, 0.8, 0.2];
        let f = fixture(&[("S1", &[], v.clone())]);

        let result = f.engine.propose(&query(v, 0.001)).unwrap();
        assert!(result.accepted);
        let best = result.best.unwrap();
        assert_eq!(best.identity_id, "S1");
        assert_eq!(best.distance, 0.0);
        assert_eq!(best.confidence, 100.0);
    }

    #[test]
    fn accepts_below_threshold() {
        // Probe at distance 0.30 from the only enrolled identity.
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);
        let probe = vec![0.30, 0.0, 0.0, 0.0];

        let result = f.engine.propose(&query(probe, 0.45)).unwrap();
        assert!(result.accepted);
        let best = result.best.unwrap();
        assert!((best.distance - 0.30).abs() < 1e-6);
        assert!((best.confidence - 70.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_above_threshold_with_diagnostics() {
        // Distance 0.52: rejected, but distance and confidence still come
        // back for diagnostics.
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);
        let probe = vec![0.52, 0.0, 0.0, 0.0];

        let result = f.engine.propose(&query(probe, 0.45)).unwrap();
        assert!(!result.accepted);
        let best = result.best.unwrap();
        assert!((best.distance - 0.52).abs() < 1e-6);
        assert!((best.confidence - 48.0).abs() < 1e-3);
    }

    #[test]
    fn empty_population_is_not_an_error() {
        let f = fixture(&[]);
        let result = f.engine.propose(&query(vec![0.0; DIM], 0.45)).unwrap();
        assert!(!result.accepted);
        assert!(result.best.is_none());
    }

    #[test]
    fn picks_nearest_of_many() {
        let f = fixture(&[
            ("S1", &[], vec![1.0, 0.0, 0.0, 0.0]),
            ("S2", &[], vec![0.0, 1.0, 0.0, 0.0]),
            ("S3", &[], vec![0.0, 0.0, 1.0, 0.0]),
        ]);

        let result = f
            .engine
            .propose(&query(vec![0.1, 0.9, 0.0, 0.0], 0.5))
            .unwrap();
        assert_eq!(result.best.unwrap().identity_id, "S2");
    }

    #[test]
    fn scope_restricts_population() {
        let f = fixture(&[
            ("S1", &["CSE", "A"], vec![1.0, 0.0, 0.0, 0.0]),
            ("S2", &["ECE", "B"], vec![0.0, 1.0, 0.0, 0.0]),
        ]);

        // Out-of-scope nearest neighbor must not be considered.
        let probe = vec![0.0, 1.0, 0.0, 0.0];
        let result = f
            .engine
            .propose(&MatchQuery {
                vector: probe.clone(),
                scope: vec!["cse".to_string()],
                threshold: 0.5,
            })
            .unwrap();
        assert!(!result.accepted);
        assert_eq!(result.best.unwrap().identity_id, "S1");

        // Scope with no population at all.
        let result = f
            .engine
            .propose(&MatchQuery {
                vector: probe,
                scope: vec!["MECH".to_string()],
                threshold: 0.5,
            })
            .unwrap();
        assert!(result.best.is_none());
    }

    #[test]
    fn probe_dimension_mismatch_is_a_hard_error() {
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);
        let err = f.engine.propose(&query(vec![0.0; DIM + 1], 0.45)).unwrap_err();
        assert!(matches!(
            err,
            MatchError::DimensionMismatch { got: 5, want: 4 }
        ));
    }

    #[test]
    fn propose_is_pure() {
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);
        let q = query(vec![0.1, 0.0, 0.0, 0.0], 0.45);

        let first = f.engine.propose(&q).unwrap();
        for _ in 0..5 {
            let again = f.engine.propose(&q).unwrap();
            assert_eq!(again.accepted, first.accepted);
            assert_eq!(
                again.best.as_ref().unwrap().identity_id,
                first.best.as_ref().unwrap().identity_id
            );
            assert_eq!(
                again.best.as_ref().unwrap().distance,
                first.best.as_ref().unwrap().distance
            );
        }

        assert!(f.ledger.is_empty());
        assert_eq!(f.store.get("S1").unwrap().unwrap().counter(TOTAL_COUNTER), 0);
    }

    #[test]
    fn tie_outcome_is_stable_across_calls() {
        // Two identities at identical distance: which one wins is a
        // don't-care, but repeated calls must agree.
        let v = vec![0.5, 0.5, 0.0, 0.0];
        let f = fixture(&[("S1", &[], v.clone()), ("S2", &[], v)]);
        let q = query(vec![0.5, 0.5, 0.1, 0.0], 0.45);

        let first = f.engine.propose(&q).unwrap().best.unwrap().identity_id;
        for _ in 0..5 {
            let again = f.engine.propose(&q).unwrap().best.unwrap().identity_id;
            assert_eq!(again, first);
        }
    }

    #[test]
    fn confirm_commits_exactly_once() {
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);

        let commit = f
            .engine
            .confirm(
                "s1",
                &ConfirmRequest {
                    kind: "Late Arrival".to_string(),
                    location: Some("Gate 2".to_string()),
                    idempotency_key: Some("event-42".to_string()),
                },
            )
            .unwrap();

        assert_eq!(commit.total, 1);
        assert_eq!(f.ledger.len(), 1);

        let record = &f.ledger.records()[0];
        assert_eq!(record.record_id, commit.record_id);
        assert_eq!(record.identity_id, "S1");
        assert_eq!(record.idempotency_key.as_deref(), Some("event-42"));

        let identity = f.store.get("S1").unwrap().unwrap();
        assert_eq!(identity.counter(TOTAL_COUNTER), 1);
        assert_eq!(identity.counter("late_arrival"), 1);
    }

    #[test]
    fn confirm_accumulates_totals() {
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);
        let late = ConfirmRequest {
            kind: "late_arrival".to_string(),
            ..ConfirmRequest::default()
        };
        let bunk = ConfirmRequest {
            kind: "bunk".to_string(),
            ..ConfirmRequest::default()
        };

        f.engine.confirm("S1", &late).unwrap();
        f.engine.confirm("S1", &bunk).unwrap();
        let commit = f.engine.confirm("S1", &late).unwrap();

        assert_eq!(commit.total, 3);
        let identity = f.store.get("S1").unwrap().unwrap();
        assert_eq!(identity.counter("late_arrival"), 2);
        assert_eq!(identity.counter("bunk"), 1);
        assert_eq!(f.ledger.len(), 3);
    }

    #[test]
    fn confirm_unknown_identity_fails() {
        let f = fixture(&[]);
        let err = f
            .engine
            .confirm("GHOST", &ConfirmRequest::default())
            .unwrap_err();
        assert!(matches!(err, MatchError::UnknownIdentity(_)));
        assert!(f.ledger.is_empty());
    }

    #[test]
    fn counter_key_shapes() {
        assert_eq!(counter_key("Late Arrival"), "late_arrival");
        assert_eq!(counter_key("bunk"), "bunk");
        assert_eq!(counter_key("  Dress-Code  "), "dress_code");
        assert_eq!(counter_key(""), "");
    }

    #[test]
    fn confirm_after_rebuild_sees_new_population() {
        let f = fixture(&[("S1", &[], vec![0.0; DIM])]);

        let mut s2 = Identity::new("S2", "", &[]);
        s2.vector = Some(vec![1.0, 0.0, 0.0, 0.0]);
        s2.status = FaceStatus::Active;
        f.store.upsert(&s2).unwrap();
        f.index.rebuild(f.store.as_ref()).unwrap();

        let result = f
            .engine
            .propose(&query(vec![1.0, 0.0, 0.0, 0.0], 0.45))
            .unwrap();
        assert_eq!(result.best.unwrap().identity_id, "S2");
    }
}
