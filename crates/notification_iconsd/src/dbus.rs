//! The D-Bus side of the daemon: the freedesktop notification server that applications talk to,
//! and a small control interface for the bar and the CLI.
//!
//! Both interfaces only forward requests to the main loop as [`DaemonCommand`]s; all state lives
//! there.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
};

use tokio::sync::{mpsc::UnboundedSender, oneshot};
use zbus::{
    interface,
    zvariant::{OwnedValue, Value},
};

use crate::{app::DaemonCommand, tray::NotificationRequest};

pub const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_OBJECT: &str = "/org/freedesktop/Notifications";
pub const CONTROL_BUS: &str = "org.eww.NotificationIcons";
pub const CONTROL_OBJECT: &str = "/org/eww/NotificationIcons";

/// Action key invoked when a notification source is activated.
pub const DEFAULT_ACTION: &str = "default";

/// Reasons sent along with `NotificationClosed`. Notifications never expire here, so only the
/// reasons for closing one on purpose exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CloseReason {
    /// Closed by the user, e.g. through the control interface.
    Dismissed = 2,
    /// Closed through `CloseNotification`.
    Closed = 3,
}

/// Instance of [`org.freedesktop.Notifications`].
///
/// [`org.freedesktop.Notifications`]: https://specifications.freedesktop.org/notification-spec/latest/protocol.html
#[derive(Debug)]
pub struct NotificationServer {
    next_id: AtomicU32,
    evt_send: UnboundedSender<DaemonCommand>,
}

impl NotificationServer {
    pub fn new(evt_send: UnboundedSender<DaemonCommand>) -> Self {
        Self { next_id: AtomicU32::new(1), evt_send }
    }

    fn allocate_id(&self, replaces_id: u32) -> u32 {
        if replaces_id != 0 {
            return replaces_id;
        }
        loop {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            // 0 means "no notification" on the wire
            if id != 0 {
                return id;
            }
        }
    }

    fn send(&self, command: DaemonCommand) -> zbus::fdo::Result<()> {
        self.evt_send.send(command).map_err(|e| zbus::fdo::Error::Failed(format!("daemon is shutting down: {}", e)))
    }
}

#[interface(name = "org.freedesktop.Notifications")]
impl NotificationServer {
    /// GetCapabilities method
    fn get_capabilities(&self) -> Vec<String> {
        vec!["body".to_string(), "actions".to_string(), "persistence".to_string()]
    }

    /// Notify method
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: String,
        replaces_id: u32,
        app_icon: String,
        summary: String,
        body: String,
        _actions: Vec<String>,
        hints: HashMap<String, OwnedValue>,
        _expire_timeout: i32,
    ) -> zbus::fdo::Result<u32> {
        let id = self.allocate_id(replaces_id);
        let request = NotificationRequest {
            id,
            replaces_id,
            app_name,
            app_icon,
            summary,
            body,
            desktop_entry: hints.get("desktop-entry").and_then(|v| string_hint(v)),
            urgency: hints.get("urgency").and_then(|v| urgency_hint(v)),
            image_path: hints.get("image-path").or_else(|| hints.get("image_path")).and_then(|v| string_hint(v)),
        };
        log::debug!("received notification {} from {:?}", id, request.app_name);
        self.send(DaemonCommand::Notify(request))?;
        Ok(id)
    }

    /// CloseNotification method
    fn close_notification(&self, id: u32) -> zbus::fdo::Result<()> {
        self.send(DaemonCommand::CloseNotification { id, reason: CloseReason::Closed })
    }

    /// GetServerInformation method
    #[zbus(out_args("name", "vendor", "version", "spec_version"))]
    fn get_server_information(&self) -> (String, String, String, String) {
        (env!("CARGO_PKG_NAME").to_string(), "eww".to_string(), env!("CARGO_PKG_VERSION").to_string(), "1.2".to_string())
    }

    /// NotificationClosed signal
    #[zbus(signal)]
    async fn notification_closed(ctxt: &zbus::SignalContext<'_>, id: u32, reason: u32) -> zbus::Result<()>;

    /// ActionInvoked signal
    #[zbus(signal)]
    async fn action_invoked(ctxt: &zbus::SignalContext<'_>, id: u32, action_key: &str) -> zbus::Result<()>;
}

/// Lets the bar and the CLI drive the icons.
#[derive(Debug)]
pub struct ControlServer {
    show_banners: bool,
    evt_send: UnboundedSender<DaemonCommand>,
}

impl ControlServer {
    pub fn new(show_banners: bool, evt_send: UnboundedSender<DaemonCommand>) -> Self {
        Self { show_banners, evt_send }
    }

    async fn request<T>(&self, make_command: impl FnOnce(oneshot::Sender<T>) -> DaemonCommand) -> zbus::fdo::Result<T> {
        let (sender, recv) = oneshot::channel();
        self.evt_send
            .send(make_command(sender))
            .map_err(|e| zbus::fdo::Error::Failed(format!("daemon is shutting down: {}", e)))?;
        recv.await.map_err(|_| zbus::fdo::Error::Failed("daemon did not respond".to_string()))
    }
}

#[interface(name = "org.eww.NotificationIcons")]
impl ControlServer {
    /// ShowBanners property. Do-not-disturb is active while this is false.
    #[zbus(property)]
    fn show_banners(&self) -> bool {
        self.show_banners
    }

    #[zbus(property)]
    fn set_show_banners(&mut self, value: bool) -> zbus::fdo::Result<()> {
        self.show_banners = value;
        self.evt_send
            .send(DaemonCommand::SetShowBanners(value))
            .map_err(|e| zbus::fdo::Error::Failed(format!("daemon is shutting down: {}", e)))
    }

    /// Activate method. Returns false if no icon with that identity is shown.
    async fn activate(&self, identity: String) -> zbus::fdo::Result<bool> {
        self.request(|sender| DaemonCommand::Activate { identity, sender }).await
    }

    /// Dismiss method. Returns how many notifications were closed.
    async fn dismiss(&self, identity: String) -> zbus::fdo::Result<u32> {
        self.request(|sender| DaemonCommand::Dismiss { identity, sender }).await
    }
}

#[zbus::proxy(
    interface = "org.eww.NotificationIcons",
    default_service = "org.eww.NotificationIcons",
    default_path = "/org/eww/NotificationIcons",
    gen_blocking = false
)]
pub trait Control {
    fn activate(&self, identity: &str) -> zbus::Result<bool>;

    fn dismiss(&self, identity: &str) -> zbus::Result<u32>;

    #[zbus(property)]
    fn show_banners(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn set_show_banners(&self, value: bool) -> zbus::Result<()>;
}

/// Claim both bus names on the session bus and serve the interfaces.
pub async fn serve(show_banners: bool, evt_send: UnboundedSender<DaemonCommand>) -> zbus::Result<zbus::Connection> {
    zbus::connection::Builder::session()?
        .name(NOTIFICATIONS_BUS)?
        .name(CONTROL_BUS)?
        .serve_at(NOTIFICATIONS_OBJECT, NotificationServer::new(evt_send.clone()))?
        .serve_at(CONTROL_OBJECT, ControlServer::new(show_banners, evt_send))?
        .build()
        .await
}

/// Emit `NotificationClosed` in the background.
pub fn emit_notification_closed(con: &zbus::Connection, id: u32, reason: CloseReason) {
    let con = con.clone();
    tokio::spawn(async move {
        let result = async {
            let ctxt = zbus::SignalContext::new(&con, NOTIFICATIONS_OBJECT)?;
            NotificationServer::notification_closed(&ctxt, id, reason as u32).await
        }
        .await;
        if let Err(e) = result {
            log::error!("failed to emit NotificationClosed for {}: {}", id, e);
        }
    });
}

/// Emit `ActionInvoked` in the background.
pub fn emit_action_invoked(con: &zbus::Connection, id: u32, action_key: &'static str) {
    let con = con.clone();
    tokio::spawn(async move {
        let result = async {
            let ctxt = zbus::SignalContext::new(&con, NOTIFICATIONS_OBJECT)?;
            NotificationServer::action_invoked(&ctxt, id, action_key).await
        }
        .await;
        if let Err(e) = result {
            log::error!("failed to emit ActionInvoked for {}: {}", id, e);
        }
    });
}

fn string_hint(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) if !s.as_str().is_empty() => Some(s.as_str().to_string()),
        _ => None,
    }
}

/// The `urgency` hint is a byte, but some clients send it as a 32 bit integer.
fn urgency_hint(value: &Value<'_>) -> Option<u8> {
    match value {
        Value::U8(b) => Some(*b),
        Value::I32(i) => u8::try_from(*i).ok(),
        Value::U32(u) => u8::try_from(*u).ok(),
        _ => None,
    }
}
