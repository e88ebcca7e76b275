use thiserror::Error;

use crate::PrefKey;

/// Failure to read state from the notification host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("host setting {0:?} is unavailable")]
    SettingUnavailable(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefError {
    #[error("preference {0} is not set")]
    Missing(PrefKey),
    #[error("preference {key} is not a {expected}")]
    WrongType { key: PrefKey, expected: &'static str },
    #[error("preference store is unavailable: {0}")]
    Unavailable(String),
}

/// Failure to construct an icon widget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("invalid icon for {identity}: {reason}")]
    InvalidIcon { identity: String, reason: String },
    #[error("{0}")]
    Other(String),
}
