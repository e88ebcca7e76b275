use notification_icons::NotificationIcons;
use tokio::sync::oneshot;

use crate::{
    dbus::CloseReason,
    json_row::JsonRow,
    prefs_file::JsonPreferences,
    tray::{MessageTray, NotificationRequest, TrayEvent},
};

/// A command for the main loop of the daemon.
#[derive(Debug)]
pub enum DaemonCommand {
    Notify(NotificationRequest),
    CloseNotification { id: u32, reason: CloseReason },
    SetShowBanners(bool),
    Activate { identity: String, sender: oneshot::Sender<bool> },
    Dismiss { identity: String, sender: oneshot::Sender<u32> },
    ReloadPreferences,
}

pub struct App {
    pub icons: NotificationIcons<MessageTray, JsonPreferences, JsonRow>,
}

impl App {
    pub fn new(tray: MessageTray, prefs: JsonPreferences, row: JsonRow) -> Self {
        App { icons: NotificationIcons::new(tray, prefs, row) }
    }

    pub fn handle_command(&mut self, command: DaemonCommand) {
        log::debug!("Handling command: {:?}", &command);
        match command {
            DaemonCommand::Notify(request) => {
                let events = self.icons.host_mut().notify(request);
                self.dispatch(events);
            }
            DaemonCommand::CloseNotification { id, reason } => match self.icons.host_mut().close(id, reason) {
                Some(events) => self.dispatch(events),
                None => log::debug!("asked to close unknown notification {}", id),
            },
            DaemonCommand::SetShowBanners(show_banners) => {
                let events = self.icons.host_mut().set_show_banners(show_banners);
                self.dispatch(events);
            }
            DaemonCommand::Activate { identity, sender } => {
                let activated = self.icons.activate(&identity);
                if sender.send(activated).is_err() {
                    log::warn!("caller went away before activating {}", identity);
                }
            }
            DaemonCommand::Dismiss { identity, sender } => {
                let closed = match self.icons.displayed_source(&identity) {
                    Some(source) => {
                        let (closed, events) = self.icons.host_mut().dismiss(&source);
                        self.dispatch(events);
                        closed
                    }
                    None => 0,
                };
                if sender.send(closed).is_err() {
                    log::warn!("caller went away before dismissing {}", identity);
                }
            }
            DaemonCommand::ReloadPreferences => match self.icons.store_mut().reload() {
                Ok(changed) if changed.is_empty() => log::debug!("preference file changed, but no preference did"),
                Ok(changed) => {
                    log::info!("preferences changed: {:?}", changed);
                    let decision = self.icons.on_preference_changed();
                    log::debug!("applied preferences: {:?}", decision);
                }
                Err(e) => log::error!("{:?}", e),
            },
        }
    }

    fn dispatch(&mut self, events: Vec<TrayEvent>) {
        for event in events {
            match event {
                TrayEvent::SourceAdded(source) => self.icons.on_source_added(&source),
                TrayEvent::SourceRemoved(source) => self.icons.on_source_removed(&source),
                TrayEvent::SourceChanged(source) => self.icons.on_source_changed(&source),
                TrayEvent::CountChanged(source) => self.icons.on_count_changed(&source),
                TrayEvent::BannersChanged => self.icons.on_dnd_state_changed(),
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.icons.destroy();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{json_row::test::SharedBuffer, prefs_file::test::temp_file};
    use notification_icons::PreferenceStore as _;
    use pretty_assertions::assert_eq;

    fn app(name: &str) -> (App, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let prefs = JsonPreferences::load(temp_file(name)).unwrap();
        let app = App::new(MessageTray::new(true, None), prefs, JsonRow::new(buffer.clone()));
        (app, buffer)
    }

    fn notify(app: &mut App, id: u32, app_name: &str, urgency: Option<u8>) {
        app.handle_command(DaemonCommand::Notify(NotificationRequest {
            id,
            app_name: app_name.to_string(),
            summary: format!("message {}", id),
            urgency,
            ..Default::default()
        }));
    }

    fn displayed(app: &App) -> Vec<String> {
        app.icons.displayed().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_notifications_and_close() {
        let (mut app, buffer) = app("app-close");
        notify(&mut app, 1, "Signal", None);
        notify(&mut app, 2, "Telegram", None);
        notify(&mut app, 3, "Signal", None);
        assert_eq!(displayed(&app), vec!["Signal", "Telegram"]);
        assert!(buffer.contents().lines().last().unwrap().contains(r#""badge":"2""#));

        app.handle_command(DaemonCommand::CloseNotification { id: 2, reason: CloseReason::Closed });
        assert_eq!(displayed(&app), vec!["Signal"]);
        app.handle_command(DaemonCommand::CloseNotification { id: 2, reason: CloseReason::Closed });
        assert_eq!(displayed(&app), vec!["Signal"]);
    }

    #[test]
    fn test_dnd_urgent_only() {
        let (mut app, _buffer) = app("app-dnd");
        notify(&mut app, 1, "Signal", None);
        notify(&mut app, 2, "Alarm", Some(2));

        app.handle_command(DaemonCommand::SetShowBanners(false));
        assert_eq!(displayed(&app), vec!["Alarm"]);

        // a new urgent notification makes its source show up
        notify(&mut app, 3, "Signal", Some(2));
        assert_eq!(displayed(&app), vec!["Alarm", "Signal"]);

        app.handle_command(DaemonCommand::SetShowBanners(true));
        assert_eq!(displayed(&app), vec!["Signal", "Alarm"]);
    }

    #[test]
    fn test_dnd_urgent_only_hides_source_that_calmed_down() {
        let (mut app, buffer) = app("app-dnd-calm");
        notify(&mut app, 1, "Alarm", Some(2));
        notify(&mut app, 2, "Alarm", None);
        app.handle_command(DaemonCommand::SetShowBanners(false));
        assert_eq!(displayed(&app), vec!["Alarm"]);

        app.handle_command(DaemonCommand::CloseNotification { id: 1, reason: CloseReason::Closed });
        assert!(displayed(&app).is_empty());
        assert_eq!(buffer.contents().lines().last(), Some(r#"{"side":"left","icons":[]}"#));

        // replacing the remaining notification with an urgent one brings the icon back
        app.handle_command(DaemonCommand::Notify(NotificationRequest {
            id: 2,
            replaces_id: 2,
            app_name: "Alarm".to_string(),
            summary: "ringing".to_string(),
            urgency: Some(2),
            ..Default::default()
        }));
        assert_eq!(displayed(&app), vec!["Alarm"]);

        // and replacing it with a normal one hides it again
        app.handle_command(DaemonCommand::Notify(NotificationRequest {
            id: 2,
            replaces_id: 2,
            app_name: "Alarm".to_string(),
            summary: "snoozed".to_string(),
            ..Default::default()
        }));
        assert!(displayed(&app).is_empty());
    }

    #[test]
    fn test_activate_and_dismiss() {
        let (mut app, _buffer) = app("app-dismiss");
        notify(&mut app, 1, "Signal", None);
        notify(&mut app, 2, "Signal", None);

        let (sender, mut recv) = oneshot::channel();
        app.handle_command(DaemonCommand::Activate { identity: "Signal".to_string(), sender });
        assert_eq!(recv.try_recv(), Ok(true));

        let (sender, mut recv) = oneshot::channel();
        app.handle_command(DaemonCommand::Dismiss { identity: "Signal".to_string(), sender });
        assert_eq!(recv.try_recv(), Ok(2));
        assert!(displayed(&app).is_empty());

        let (sender, mut recv) = oneshot::channel();
        app.handle_command(DaemonCommand::Activate { identity: "Signal".to_string(), sender });
        assert_eq!(recv.try_recv(), Ok(false));
    }

    #[test]
    fn test_reload_preferences() {
        let (mut app, buffer) = app("app-prefs");
        notify(&mut app, 1, "Signal", None);
        assert!(buffer.contents().lines().last().unwrap().contains(r#""pixel_size":18"#));

        let mut writer = JsonPreferences::load(app.icons.store().path()).unwrap();
        writer.set_int(notification_icons::PrefKey::IconSize, 2).unwrap();
        writer.set_bool(notification_icons::PrefKey::RightSide, true).unwrap();
        writer.save().unwrap();

        app.handle_command(DaemonCommand::ReloadPreferences);
        let last = buffer.contents().lines().last().unwrap().to_string();
        assert!(last.contains(r#""pixel_size":20"#));
        assert!(last.starts_with(r#"{"side":"right""#));
        std::fs::remove_file(app.icons.store().path()).unwrap();
    }

    #[test]
    fn test_shutdown() {
        let (mut app, buffer) = app("app-shutdown");
        notify(&mut app, 1, "Signal", None);
        app.shutdown();
        assert!(app.icons.is_destroyed());
        assert_eq!(buffer.contents().lines().last(), Some(r#"{"side":"left","icons":[]}"#));

        notify(&mut app, 2, "Telegram", None);
        assert!(displayed(&app).is_empty());
    }
}
