use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use faceguard_filestore::StorageLayout;

/// Enrollment state of an identity.
///
/// `Active` holds exactly when a vector is present and was derived from at
/// least the configured number of quality-gated images. Only the
/// enrollment engine makes the pending-to-active transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceStatus {
    #[default]
    Pending,
    Active,
}

impl std::fmt::Display for FaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// One enrolled subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique, case-normalized key.
    pub identity_id: String,

    /// Display name; defaults to the identity id.
    #[serde(default)]
    pub name: String,

    /// Ordered classification segments (e.g. department, section).
    /// Empty for flat layouts.
    #[serde(default)]
    pub group_path: Vec<String>,

    /// Averaged identity vector. Absent while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,

    #[serde(default)]
    pub status: FaceStatus,

    /// Filenames currently backing `vector`, sorted. Replaced wholesale on
    /// re-enrollment.
    #[serde(default)]
    pub source_images: Vec<String>,

    /// Layout the identity's files were last resolved under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<StorageLayout>,

    /// Violation counters (`total` plus per-kind keys). Monotonically
    /// non-decreasing; written only through the atomic increment operation.
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a pending identity. The id and group segments are normalized.
    pub fn new(identity_id: &str, name: &str, group_path: &[String]) -> Self {
        let identity_id = normalize_id(identity_id);
        let name = if name.trim().is_empty() {
            identity_id.clone()
        } else {
            name.trim().to_string()
        };
        let now = Utc::now();
        Self {
            identity_id,
            name,
            group_path: normalize_group(group_path),
            vector: None,
            status: FaceStatus::Pending,
            source_images: Vec::new(),
            layout: None,
            counters: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FaceStatus::Active
    }

    /// Drop the vector and return to pending. The record itself is kept;
    /// deletion is an administrative action outside this core.
    pub fn demote(&mut self) {
        self.vector = None;
        self.status = FaceStatus::Pending;
        self.updated_at = Utc::now();
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }
}

/// Canonical form of an identity id: trimmed and ASCII-uppercased.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

/// Canonical form of a group path, segment-wise. Empty segments are dropped.
pub fn normalize_group(group_path: &[String]) -> Vec<String> {
    group_path
        .iter()
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
