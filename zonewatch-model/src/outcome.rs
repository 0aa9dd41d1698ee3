use std::path::PathBuf;

use crate::zone::TrustZone;

/// Immutable record of one file run through the policy pipeline.
///
/// `zone` is the resulting zone for reassignments and the observed zone
/// for removals; consumers aggregate it into per-zone statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ProcessingOutcome {
    pub path: PathBuf,
    pub success: bool,
    pub message: String,
    /// File size in bytes, 0 when unavailable.
    pub size_bytes: u64,
    pub zone: TrustZone,
}

impl ProcessingOutcome {
    pub fn success(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        size_bytes: u64,
        zone: TrustZone,
    ) -> Self {
        Self {
            path: path.into(),
            success: true,
            message: message.into(),
            size_bytes,
            zone,
        }
    }

    pub fn failure(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        size_bytes: u64,
        zone: TrustZone,
    ) -> Self {
        Self {
            path: path.into(),
            success: false,
            message: message.into(),
            size_bytes,
            zone,
        }
    }
}
