//! The notification registry the icons are built from: notifications received over D-Bus,
//! grouped into sources.

use std::rc::Rc;

use notification_icons::{
    HandlerId, HostError, HostSignal, IconData, Notification, NotificationHost, SignalTable, Source, SourceInfo, SourceKey,
    Urgency, GENERIC_POLICY_ID,
};

use crate::dbus::{self, CloseReason};

/// A notification as received through `org.freedesktop.Notifications.Notify`, with the hints
/// we care about already extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationRequest {
    /// Id assigned by the server. Equal to `replaces_id` when that was non-zero.
    pub id: u32,
    pub replaces_id: u32,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub desktop_entry: Option<String>,
    pub urgency: Option<u8>,
    pub image_path: Option<String>,
}

/// What notifications of a source have in common.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupKey {
    DesktopEntry(String),
    AppName(String),
    /// Notifications without any app information each get a source of their own.
    Anonymous(u32),
}

impl GroupKey {
    fn of(request: &NotificationRequest) -> Self {
        match (&request.desktop_entry, request.app_name.as_str()) {
            (Some(entry), _) if !entry.is_empty() => GroupKey::DesktopEntry(entry.clone()),
            (_, name) if !name.is_empty() => GroupKey::AppName(name.to_string()),
            _ => GroupKey::Anonymous(request.id),
        }
    }

    fn source_info(&self, request: &NotificationRequest) -> SourceInfo {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        let icon = IconData::parse(&request.app_icon);
        match self {
            GroupKey::DesktopEntry(entry) => SourceInfo {
                policy_id: Some(entry.clone()),
                app_id: Some(entry.clone()),
                title: non_empty(&request.app_name),
                icon,
            },
            GroupKey::AppName(name) => {
                SourceInfo { policy_id: Some(GENERIC_POLICY_ID.to_string()), app_id: None, title: Some(name.clone()), icon }
            }
            GroupKey::Anonymous(_) => SourceInfo {
                policy_id: Some(GENERIC_POLICY_ID.to_string()),
                app_id: None,
                title: non_empty(&request.summary),
                icon,
            },
        }
    }
}

/// Something the icons need to hear about. Only produced while a handler for the matching
/// [`HostSignal`] is connected.
#[derive(Debug, Clone)]
pub enum TrayEvent {
    SourceAdded(Rc<Source>),
    SourceRemoved(Rc<Source>),
    SourceChanged(Rc<Source>),
    CountChanged(Rc<Source>),
    BannersChanged,
}

/// Notification sources in the order they first showed up.
#[derive(Debug)]
pub struct MessageTray {
    sources: Vec<(GroupKey, Rc<Source>)>,
    show_banners: bool,
    signals: SignalTable<HostSignal>,
    /// Used to emit `NotificationClosed` and `ActionInvoked`. Without one, nothing is emitted.
    connection: Option<zbus::Connection>,
}

impl MessageTray {
    pub fn new(show_banners: bool, connection: Option<zbus::Connection>) -> Self {
        Self { sources: Vec::new(), show_banners, signals: SignalTable::new(), connection }
    }

    pub fn set_show_banners(&mut self, show_banners: bool) -> Vec<TrayEvent> {
        if self.show_banners == show_banners {
            return Vec::new();
        }
        self.show_banners = show_banners;
        self.filter_events(vec![TrayEvent::BannersChanged])
    }

    /// Add a notification, creating its source if needed.
    pub fn notify(&mut self, request: NotificationRequest) -> Vec<TrayEvent> {
        let key = GroupKey::of(&request);
        let mut events = Vec::new();
        // within the same source, the notification is replaced in place below
        let moved_elsewhere = request.replaces_id != 0
            && self.sources.iter().any(|(k, s)| *k != key && s.notifications().iter().any(|n| n.id == request.replaces_id));
        if moved_elsewhere {
            events.extend(self.remove_notification(request.replaces_id).unwrap_or_default());
        }

        let mut notification = Notification::new(request.id, request.summary.clone());
        notification.body = request.body.clone();
        notification.urgency = request.urgency.map(Urgency::Code);
        notification.icon = request.image_path.as_deref().and_then(IconData::parse);

        match self.sources.iter().find(|(k, _)| *k == key) {
            Some((_, source)) => {
                let source = source.clone();
                source.push_notification(notification);
                events.push(TrayEvent::SourceChanged(source.clone()));
                events.push(TrayEvent::CountChanged(source));
            }
            None => {
                let source = Source::new(key.source_info(&request));
                source.push_notification(notification);
                log::debug!("new notification source {:?}", key);
                self.sources.push((key, source.clone()));
                events.push(TrayEvent::SourceAdded(source));
            }
        }
        self.filter_events(events)
    }

    /// Close a single notification. Returns `None` if there is no notification with that id.
    pub fn close(&mut self, id: u32, reason: CloseReason) -> Option<Vec<TrayEvent>> {
        let events = self.remove_notification(id)?;
        self.emit_closed(id, reason);
        Some(self.filter_events(events))
    }

    /// Close every notification of `source`. Returns how many were closed.
    pub fn dismiss(&mut self, source: &Rc<Source>) -> (u32, Vec<TrayEvent>) {
        let Some(idx) = self.sources.iter().position(|(_, s)| Rc::ptr_eq(s, source)) else {
            return (0, Vec::new());
        };
        let (_, source) = self.sources.remove(idx);
        let closed = source.take_notifications();
        for notification in &closed {
            self.emit_closed(notification.id, CloseReason::Dismissed);
        }
        let count = u32::try_from(closed.len()).unwrap_or(u32::MAX);
        (count, self.filter_events(vec![TrayEvent::SourceRemoved(source)]))
    }

    fn remove_notification(&mut self, id: u32) -> Option<Vec<TrayEvent>> {
        let idx = self.sources.iter().position(|(_, s)| s.notifications().iter().any(|n| n.id == id))?;
        let source = self.sources[idx].1.clone();
        source.remove_notification(id);
        if source.notification_count() == 0 {
            self.sources.remove(idx);
            Some(vec![TrayEvent::SourceRemoved(source)])
        } else {
            Some(vec![TrayEvent::SourceChanged(source.clone()), TrayEvent::CountChanged(source)])
        }
    }

    fn filter_events(&self, events: Vec<TrayEvent>) -> Vec<TrayEvent> {
        events
            .into_iter()
            .filter(|event| {
                let signal = match event {
                    TrayEvent::SourceAdded(_) => HostSignal::SourceAdded,
                    TrayEvent::SourceRemoved(_) => HostSignal::SourceRemoved,
                    TrayEvent::SourceChanged(_) => HostSignal::SourceChanged,
                    TrayEvent::CountChanged(source) => HostSignal::CountChanged(SourceKey::of(source)),
                    TrayEvent::BannersChanged => HostSignal::BannersChanged,
                };
                self.signals.is_connected(&signal)
            })
            .collect()
    }

    fn emit_closed(&self, id: u32, reason: CloseReason) {
        if let Some(connection) = &self.connection {
            dbus::emit_notification_closed(connection, id, reason);
        }
    }
}

impl NotificationHost for MessageTray {
    fn sources(&self) -> Vec<Rc<Source>> {
        self.sources.iter().map(|(_, source)| source.clone()).collect()
    }

    fn banners_enabled(&self) -> Result<bool, HostError> {
        Ok(self.show_banners)
    }

    fn connect(&mut self, signal: HostSignal) -> HandlerId {
        self.signals.connect(signal)
    }

    fn disconnect(&mut self, id: HandlerId) {
        self.signals.disconnect(id);
    }

    fn show_banner(&mut self, source: &Source) {
        let Some(id) = source.newest_notification_id() else {
            log::debug!("nothing to show for {:?}", source.title());
            return;
        };
        if let Some(connection) = &self.connection {
            dbus::emit_action_invoked(connection, id, dbus::DEFAULT_ACTION);
        }
    }
}
