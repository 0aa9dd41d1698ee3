use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("file path cannot be empty")]
    EmptyPath,

    #[error("file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    InvalidZone(#[from] zonewatch_model::ModelError),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "zone 4 (Restricted Sites) files cannot be reassigned - explicitly restricted by policy"
    )]
    RestrictedZoneProtected,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ZoneError>;
