use std::rc::Rc;

use crate::*;

/// Events a [`NotificationHost`] can notify about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostSignal {
    SourceAdded,
    SourceRemoved,
    /// The notifications of one source changed (one arrived, was replaced or was closed), which
    /// may change whether it passes the do-not-disturb policy.
    SourceChanged,
    /// The "banners enabled" setting, i.e. do-not-disturb, changed.
    BannersChanged,
    /// The number of notifications of one source changed.
    CountChanged(SourceKey),
}

/// The notification registry of the desktop shell we're running in.
///
/// The host delivers events by calling the matching `on_*` method of
/// [`NotificationIcons`][crate::NotificationIcons], but only while a handler for that event is
/// connected.
pub trait NotificationHost {
    /// All sources currently known, in the order they should be displayed.
    fn sources(&self) -> Vec<Rc<Source>>;

    /// Whether notification banners are shown. Do-not-disturb is active when they are not.
    fn banners_enabled(&self) -> Result<bool, HostError>;

    fn connect(&mut self, signal: HostSignal) -> HandlerId;

    /// Disconnecting a handler that isn't connected is not an error.
    fn disconnect(&mut self, id: HandlerId);

    /// Bring up the notifications of `source`, e.g. after its icon was clicked.
    fn show_banner(&mut self, source: &Source) {
        log::debug!("host can't show banners, ignoring activation of {:?}", source.title());
    }
}

/// Everything a row needs to build the widget of one icon.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IconSpec {
    pub identity: SourceIdentity,
    pub image: IconImage,
    pub pixel_size: u32,
    /// Render the icon without color.
    pub desaturated: bool,
    pub badge: Option<String>,
}

/// The container showing icon widgets, e.g. a horizontal box in a panel.
///
/// Mutations don't need to become visible before [`IconRow::commit`] is called.
pub trait IconRow {
    type Icon;

    fn create_icon(&mut self, spec: &IconSpec) -> Result<Self::Icon, RowError>;

    fn insert_icon(&mut self, icon: &Self::Icon, index: usize);

    /// Remove the icon from the row and destroy it.
    fn remove_icon(&mut self, icon: Self::Icon);

    fn set_badge(&mut self, icon: &mut Self::Icon, badge: Option<&str>);

    fn set_side(&mut self, side: Side);

    fn commit(&mut self) {}
}
