use serde::{Deserialize, Serialize};

use crate::{HostError, Source};

/// Which icons stay visible while do-not-disturb is active.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString, strum::FromRepr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum DndMode {
    Always = 0,
    #[default]
    UrgentOnly = 1,
    Never = 2,
}

impl DndMode {
    /// Map the raw `dnd-mode` preference value. Unknown values show everything.
    pub fn from_raw(raw: i32) -> Self {
        DndMode::from_repr(raw).unwrap_or(DndMode::Always)
    }
}

/// Whether do-not-disturb is currently active on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DndState {
    pub active: bool,
}

impl DndState {
    /// Derive the state from the host's "banners enabled" setting.
    ///
    /// If the setting can't be read, do-not-disturb is assumed to be off.
    pub fn from_banners_enabled(banners_enabled: Result<bool, HostError>) -> Self {
        match banners_enabled {
            Ok(enabled) => DndState { active: !enabled },
            Err(e) => {
                log::warn!("could not read do-not-disturb state, assuming it is off: {}", e);
                DndState { active: false }
            }
        }
    }
}

/// Decide whether `source` gets an icon.
pub fn should_show(source: &Source, dnd: DndState, mode: DndMode) -> bool {
    if !dnd.active {
        return true;
    }
    match mode {
        DndMode::Always => true,
        DndMode::Never => false,
        DndMode::UrgentOnly => source.notifications().iter().any(|n| n.is_urgent()),
    }
}
