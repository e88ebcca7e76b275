use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::{DndMode, HandlerId, PrefError};

/// Keys understood by a [`PreferenceStore`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum PrefKey {
    RightSide,
    ColoredIcons,
    DndMode,
    IconSize,
    NotificationCount,
    HideCountWhenOne,
}

/// Which side of its anchor the icon row sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString, strum::FromRepr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[repr(i32)]
pub enum IconSize {
    Small = 0,
    #[default]
    Medium = 1,
    Large = 2,
}

impl IconSize {
    /// Map the raw `icon-size` preference value, falling back to [`IconSize::Medium`].
    pub fn from_raw(raw: i32) -> Self {
        IconSize::from_repr(raw).unwrap_or_default()
    }

    pub fn pixels(&self) -> u32 {
        match self {
            IconSize::Small => 16,
            IconSize::Medium => 18,
            IconSize::Large => 20,
        }
    }
}

/// Typed access to the preference keys, with change notification per key.
pub trait PreferenceStore {
    fn get_bool(&self, key: PrefKey) -> Result<bool, PrefError>;
    fn get_int(&self, key: PrefKey) -> Result<i32, PrefError>;
    fn set_bool(&mut self, key: PrefKey, value: bool) -> Result<(), PrefError>;
    fn set_int(&mut self, key: PrefKey, value: i32) -> Result<(), PrefError>;

    fn connect_changed(&mut self, key: PrefKey) -> HandlerId;
    /// Disconnecting a handler that isn't connected is not an error.
    fn disconnect(&mut self, id: HandlerId);
}

/// A snapshot of every preference that affects the icon row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
pub struct Preferences {
    pub right_side: bool,
    pub colored_icons: bool,
    pub dnd_mode: DndMode,
    pub icon_size: IconSize,
    #[default(true)]
    pub notification_count: bool,
    pub hide_count_when_one: bool,
}

impl Preferences {
    /// Read a snapshot from `store`. Keys that can't be read keep their default value.
    pub fn load(store: &impl PreferenceStore) -> Self {
        let defaults = Preferences::default();
        let read_bool = |key, default| match store.get_bool(key) {
            Ok(value) => value,
            Err(PrefError::Missing(_)) => default,
            Err(e) => {
                log::warn!("using default for preference {}: {}", key, e);
                default
            }
        };
        let read_int = |key| match store.get_int(key) {
            Ok(value) => Some(value),
            Err(PrefError::Missing(_)) => None,
            Err(e) => {
                log::warn!("using default for preference {}: {}", key, e);
                None
            }
        };

        Preferences {
            right_side: read_bool(PrefKey::RightSide, defaults.right_side),
            colored_icons: read_bool(PrefKey::ColoredIcons, defaults.colored_icons),
            dnd_mode: read_int(PrefKey::DndMode).map(DndMode::from_raw).unwrap_or(defaults.dnd_mode),
            icon_size: read_int(PrefKey::IconSize).map(IconSize::from_raw).unwrap_or(defaults.icon_size),
            notification_count: read_bool(PrefKey::NotificationCount, defaults.notification_count),
            hide_count_when_one: read_bool(PrefKey::HideCountWhenOne, defaults.hide_count_when_one),
        }
    }

    pub fn side(&self) -> Side {
        if self.right_side {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Keys whose value differs between `self` and `other`.
    pub fn changed_keys(&self, other: &Preferences) -> Vec<PrefKey> {
        let mut changed = Vec::new();
        if self.right_side != other.right_side {
            changed.push(PrefKey::RightSide);
        }
        if self.colored_icons != other.colored_icons {
            changed.push(PrefKey::ColoredIcons);
        }
        if self.dnd_mode != other.dnd_mode {
            changed.push(PrefKey::DndMode);
        }
        if self.icon_size != other.icon_size {
            changed.push(PrefKey::IconSize);
        }
        if self.notification_count != other.notification_count {
            changed.push(PrefKey::NotificationCount);
        }
        if self.hide_count_when_one != other.hide_count_when_one {
            changed.push(PrefKey::HideCountWhenOne);
        }
        changed
    }

    /// Text of the unread badge for a source with `count` notifications, or `None` if the badge
    /// is hidden.
    pub fn badge_text(&self, count: usize) -> Option<String> {
        if !self.notification_count || count == 0 || (count == 1 && self.hide_count_when_one) {
            None
        } else {
            Some(count.to_string())
        }
    }
}

/// What has to happen after the preferences changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildDecision {
    /// Every icon has to be rebuilt.
    pub rebuild: bool,
    /// The row has to move to the other side of its anchor.
    pub reposition: bool,
}

impl RebuildDecision {
    pub fn from_changes(changed: &[PrefKey]) -> Self {
        let mut decision = RebuildDecision::default();
        for key in changed {
            match key {
                PrefKey::RightSide => decision.reposition = true,
                PrefKey::ColoredIcons
                | PrefKey::IconSize
                | PrefKey::DndMode
                | PrefKey::NotificationCount
                | PrefKey::HideCountWhenOne => decision.rebuild = true,
            }
        }
        decision
    }
}

/// Remembers the last preference snapshot so changes can be diffed against it.
#[derive(Debug, Clone)]
pub struct PreferenceTracker {
    current: Preferences,
}

impl PreferenceTracker {
    pub fn new(initial: Preferences) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> &Preferences {
        &self.current
    }

    /// Replace the remembered snapshot with `new` and report what needs to be done.
    pub fn update(&mut self, new: Preferences) -> RebuildDecision {
        let changed = self.current.changed_keys(&new);
        if !changed.is_empty() {
            log::debug!("preferences changed: {:?}", changed);
        }
        self.current = new;
        RebuildDecision::from_changes(&changed)
    }
}
