use std::{
    cell::{Ref, RefCell},
    path::PathBuf,
    rc::Rc,
};

use serde::Serialize;

/// Named urgency levels, from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Normal,
    High,
    Critical,
}

/// Urgency of a single notification.
///
/// Hosts report urgency either as a bare integer code (the freedesktop `urgency` hint uses 0-2,
/// other hosts count up to 3) or as a named level. Both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Code(u8),
    Level(UrgencyLevel),
}

impl Urgency {
    /// Whether this urgency lets a notification through "urgent only" do-not-disturb filtering.
    ///
    /// Codes 2 and 3 as well as the [`UrgencyLevel::High`] and [`UrgencyLevel::Critical`] levels
    /// count as urgent.
    pub fn is_urgent(&self) -> bool {
        match self {
            Urgency::Code(code) => matches!(code, 2 | 3),
            Urgency::Level(level) => *level >= UrgencyLevel::High,
        }
    }
}

impl From<UrgencyLevel> for Urgency {
    fn from(level: UrgencyLevel) -> Self {
        Urgency::Level(level)
    }
}

/// A bitmap icon in ARGB32, row-major, without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Pixmap {
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() as u64 == u64::from(self.width) * u64::from(self.height) * 4
    }
}

/// Icon information a source or notification may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconData {
    /// Themed icon names, most specific first.
    Themed(Vec<String>),
    File(PathBuf),
    /// The same icon in one or more sizes.
    Pixmaps(Vec<Pixmap>),
}

impl IconData {
    /// Interpret an icon string as sent over the wire.
    ///
    /// `file://` URIs and absolute paths become [`IconData::File`], anything else is taken as a
    /// themed icon name. Returns `None` for an empty string.
    pub fn parse(s: &str) -> Option<IconData> {
        let s = s.trim();
        if s.is_empty() {
            None
        } else if let Some(path) = s.strip_prefix("file://") {
            Some(IconData::File(PathBuf::from(path)))
        } else if s.starts_with('/') {
            Some(IconData::File(PathBuf::from(s)))
        } else {
            Some(IconData::Themed(vec![s.to_owned()]))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u32,
    pub summary: String,
    pub body: String,
    pub urgency: Option<Urgency>,
    pub icon: Option<IconData>,
}

impl Notification {
    pub fn new(id: u32, summary: impl Into<String>) -> Self {
        Self { id, summary: summary.into(), body: String::new(), urgency: None, icon: None }
    }

    pub fn with_urgency(mut self, urgency: impl Into<Urgency>) -> Self {
        self.urgency = Some(urgency.into());
        self
    }

    pub fn with_icon(mut self, icon: IconData) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn is_urgent(&self) -> bool {
        self.urgency.is_some_and(|u| u.is_urgent())
    }
}

/// The identifying fields of a [`Source`]. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceInfo {
    /// Identifier of the host's permission/policy record for this source.
    pub policy_id: Option<String>,
    pub app_id: Option<String>,
    pub title: Option<String>,
    pub icon: Option<IconData>,
}

/// A logical origin of notifications, owned by the host and shared with the reconciler.
///
/// The notification list is mutated by the host while the source is alive; a source that
/// never tracked any notifications simply has an empty list.
#[derive(Debug)]
pub struct Source {
    info: SourceInfo,
    notifications: RefCell<Vec<Notification>>,
}

impl Source {
    pub fn new(info: SourceInfo) -> Rc<Self> {
        Rc::new(Self { info, notifications: RefCell::new(Vec::new()) })
    }

    pub fn policy_id(&self) -> Option<&str> {
        self.info.policy_id.as_deref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.info.app_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.info.title.as_deref()
    }

    pub fn icon(&self) -> Option<&IconData> {
        self.info.icon.as_ref()
    }

    pub fn notifications(&self) -> Ref<'_, [Notification]> {
        Ref::map(self.notifications.borrow(), |n| n.as_slice())
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.borrow().len()
    }

    /// Add a notification, replacing one with the same id if present.
    pub fn push_notification(&self, notification: Notification) {
        let mut notifications = self.notifications.borrow_mut();
        match notifications.iter_mut().find(|n| n.id == notification.id) {
            Some(existing) => *existing = notification,
            None => notifications.push(notification),
        }
    }

    pub fn remove_notification(&self, id: u32) -> Option<Notification> {
        let mut notifications = self.notifications.borrow_mut();
        let idx = notifications.iter().position(|n| n.id == id)?;
        Some(notifications.remove(idx))
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.borrow_mut())
    }

    pub fn newest_notification_id(&self) -> Option<u32> {
        self.notifications.borrow().last().map(|n| n.id)
    }
}

/// Identifies a source *instance* (not its contents) for as long as it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(usize);

impl SourceKey {
    pub fn of(source: &Rc<Source>) -> Self {
        SourceKey(Rc::as_ptr(source) as usize)
    }
}
