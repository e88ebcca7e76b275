use std::str::FromStr;

use anyhow::{bail, Context, Result};
use notification_icons::{DndMode, IconSize, PrefKey, PreferenceStore, Preferences};

use crate::{
    dbus::ControlProxy,
    opts::{ActionClientOnly, ActionWithServer, DndSwitch},
    paths::Paths,
    prefs_file::JsonPreferences,
};

pub fn handle_client_only_action(paths: &Paths, action: ActionClientOnly) -> Result<()> {
    let mut prefs = JsonPreferences::load(paths.get_preferences_file())?;
    match action {
        ActionClientOnly::Set { key, value } => {
            set_from_str(&mut prefs, key, &value)?;
            prefs.save()?;
        }
        ActionClientOnly::Get { key } => {
            println!("{}", effective_value(&Preferences::load(&prefs), key));
        }
    }
    Ok(())
}

/// Store `value` under `key`, accepting names for the enumerated preferences.
fn set_from_str(prefs: &mut impl PreferenceStore, key: PrefKey, value: &str) -> Result<()> {
    let value = value.trim();
    let result = match key {
        PrefKey::RightSide | PrefKey::ColoredIcons | PrefKey::NotificationCount | PrefKey::HideCountWhenOne => {
            let value = bool::from_str(value).with_context(|| format!("{} expects true or false, got {:?}", key, value))?;
            prefs.set_bool(key, value)
        }
        PrefKey::DndMode => prefs.set_int(key, parse_int_or_name::<DndMode>(key, value, |mode| mode as i32)?),
        PrefKey::IconSize => prefs.set_int(key, parse_int_or_name::<IconSize>(key, value, |size| size as i32)?),
    };
    Ok(result?)
}

fn parse_int_or_name<T: FromStr>(key: PrefKey, value: &str, to_int: impl Fn(T) -> i32) -> Result<i32> {
    if let Ok(i) = value.parse::<i32>() {
        return Ok(i);
    }
    match value.parse::<T>() {
        Ok(named) => Ok(to_int(named)),
        Err(_) => bail!("{} expects a number or a name, got {:?}", key, value),
    }
}

/// The value the daemon would use for `key`, after defaults and fallbacks.
fn effective_value(prefs: &Preferences, key: PrefKey) -> String {
    match key {
        PrefKey::RightSide => prefs.right_side.to_string(),
        PrefKey::ColoredIcons => prefs.colored_icons.to_string(),
        PrefKey::DndMode => prefs.dnd_mode.to_string(),
        PrefKey::IconSize => prefs.icon_size.to_string(),
        PrefKey::NotificationCount => prefs.notification_count.to_string(),
        PrefKey::HideCountWhenOne => prefs.hide_count_when_one.to_string(),
    }
}

pub fn handle_server_action(action: ActionWithServer) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("Failed to initialize tokio runtime")?;
    rt.block_on(async {
        let connection = zbus::Connection::session().await.context("Failed to connect to the session bus")?;
        let proxy = ControlProxy::new(&connection).await?;
        match action {
            ActionWithServer::Dnd { state } => {
                let show_banners = match state {
                    DndSwitch::On => false,
                    DndSwitch::Off => true,
                    DndSwitch::Toggle => !proxy.show_banners().await.context("Failed to reach the daemon. Is it running?")?,
                };
                proxy.set_show_banners(show_banners).await.context("Failed to reach the daemon. Is it running?")?;
                println!("do-not-disturb {}", if show_banners { "off" } else { "on" });
            }
            ActionWithServer::Activate { identity } => {
                if !proxy.activate(&identity).await.context("Failed to reach the daemon. Is it running?")? {
                    bail!("No icon shown for {:?}", identity);
                }
            }
            ActionWithServer::Dismiss { identity } => {
                let closed = proxy.dismiss(&identity).await.context("Failed to reach the daemon. Is it running?")?;
                println!("closed {} notification(s)", closed);
            }
        }
        Ok(())
    })
}
