use std::fmt::{self, Display, Formatter};

use crate::error::ModelError;

/// URL security zone recorded in a file's origin marker.
///
/// Ordering is significant: lower values denote higher trust. `Restricted`
/// is a hard floor that automatic policy observes but never assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum TrustZone {
    /// Local machine (zone 0)
    LocalMachine = 0,
    /// Local intranet (zone 1)
    Intranet = 1,
    /// Trusted sites (zone 2)
    Trusted = 2,
    /// Internet (zone 3)
    Internet = 3,
    /// Restricted sites (zone 4)
    Restricted = 4,
}

impl TrustZone {
    /// Numeric identifier as stored in the marker side-channel.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The next more-trusted zone, or `None` when already at `LocalMachine`.
    pub const fn next_lower(self) -> Option<TrustZone> {
        match self {
            TrustZone::LocalMachine => None,
            TrustZone::Intranet => Some(TrustZone::LocalMachine),
            TrustZone::Trusted => Some(TrustZone::Intranet),
            TrustZone::Internet => Some(TrustZone::Trusted),
            TrustZone::Restricted => Some(TrustZone::Internet),
        }
    }

    /// Parse a raw integer zone id, rejecting values outside `0..=4`.
    pub fn from_id(id: i64) -> Result<TrustZone, ModelError> {
        match id {
            0 => Ok(TrustZone::LocalMachine),
            1 => Ok(TrustZone::Intranet),
            2 => Ok(TrustZone::Trusted),
            3 => Ok(TrustZone::Internet),
            4 => Ok(TrustZone::Restricted),
            other => Err(ModelError::InvalidZone(other)),
        }
    }
}

impl Display for TrustZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TrustZone::LocalMachine => write!(f, "Local Machine"),
            TrustZone::Intranet => write!(f, "Local Intranet"),
            TrustZone::Trusted => write!(f, "Trusted Sites"),
            TrustZone::Internet => write!(f, "Internet"),
            TrustZone::Restricted => write!(f, "Restricted Sites"),
        }
    }
}

impl TryFrom<u8> for TrustZone {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TrustZone::from_id(i64::from(value))
    }
}

impl From<TrustZone> for u8 {
    fn from(zone: TrustZone) -> Self {
        zone.id()
    }
}
