use std::rc::{Rc, Weak};

use strum::IntoEnumIterator;

use crate::*;

/// An icon currently shown in the row.
struct DisplayedIcon<I> {
    identity: SourceIdentity,
    source: Weak<Source>,
    widget: I,
    /// Subscription to the source's notification count, while a badge is being maintained.
    badge_handler: Option<HandlerId>,
}

/// Keeps the icons of an [`IconRow`] in sync with the sources of a [`NotificationHost`].
///
/// At any point the row shows exactly one icon per identity of the host's sources that passes
/// [`should_show`], in the order the host lists them (sources added later are appended).
///
/// Construction connects to every host signal and preference key it reacts to; [`destroy`]
/// (also run on drop) disconnects all of them again before tearing down the widgets. Once
/// destroyed, every event is ignored.
///
/// [`destroy`]: NotificationIcons::destroy
pub struct NotificationIcons<H: NotificationHost, S: PreferenceStore, R: IconRow> {
    host: H,
    store: S,
    row: R,
    identities: IdentityResolver,
    prefs: PreferenceTracker,
    dnd: DndState,
    icons: Vec<DisplayedIcon<R::Icon>>,
    host_handlers: Vec<HandlerId>,
    pref_handlers: Vec<HandlerId>,
    destroyed: bool,
}

impl<H: NotificationHost, S: PreferenceStore, R: IconRow> NotificationIcons<H, S, R> {
    pub fn new(mut host: H, mut store: S, mut row: R) -> Self {
        let prefs = Preferences::load(&store);
        let host_handlers =
            [HostSignal::SourceAdded, HostSignal::SourceRemoved, HostSignal::SourceChanged, HostSignal::BannersChanged]
                .into_iter()
                .map(|signal| host.connect(signal))
                .collect();
        let pref_handlers = PrefKey::iter().map(|key| store.connect_changed(key)).collect();
        let dnd = DndState::from_banners_enabled(host.banners_enabled());
        row.set_side(prefs.side());

        let mut icons = NotificationIcons {
            host,
            store,
            row,
            identities: IdentityResolver::new(),
            prefs: PreferenceTracker::new(prefs),
            dnd,
            icons: Vec::new(),
            host_handlers,
            pref_handlers,
            destroyed: false,
        };
        icons.rebuild();
        icons
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn row(&self) -> &R {
        &self.row
    }

    pub fn preferences(&self) -> &Preferences {
        self.prefs.current()
    }

    pub fn dnd_state(&self) -> DndState {
        self.dnd
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Identities of the displayed icons, in display order.
    pub fn displayed(&self) -> impl Iterator<Item = &SourceIdentity> {
        self.icons.iter().map(|icon| &icon.identity)
    }

    /// The source behind a displayed icon, if it is still alive.
    pub fn displayed_source(&self, identity: &str) -> Option<Rc<Source>> {
        self.icons.iter().find(|icon| icon.identity == identity).and_then(|icon| icon.source.upgrade())
    }

    pub fn on_source_added(&mut self, source: &Rc<Source>) {
        if self.destroyed {
            log::debug!("ignoring added source after destroy");
            return;
        }
        if self.add_source(source) {
            self.row.commit();
        }
    }

    pub fn on_source_removed(&mut self, source: &Rc<Source>) {
        if self.destroyed {
            log::debug!("ignoring removed source after destroy");
            return;
        }
        let identity = self.identities.identify(source);
        if let Some(idx) = self.position(&identity) {
            self.remove_icon_at(idx, source);
            self.row.commit();
        }
    }

    /// Re-check `source` against the visibility policy after its notifications changed, showing
    /// or hiding its icon accordingly.
    pub fn on_source_changed(&mut self, source: &Rc<Source>) {
        if self.destroyed {
            return;
        }
        let identity = self.identities.identify(source);
        let visible = self.passes_policy(source);
        match self.position(&identity) {
            Some(idx) if !visible => {
                // the icon belongs to an alias
                if !self.icons[idx].source.upgrade().is_some_and(|shown| Rc::ptr_eq(&shown, source)) {
                    return;
                }
                log::debug!("hiding {} while do-not-disturb is active", identity);
                self.remove_icon_at(idx, source);
                self.row.commit();
            }
            None if visible => {
                if self.add_source(source) {
                    self.row.commit();
                }
            }
            _ => {}
        }
    }

    /// Refresh the unread badge of `source`'s icon.
    pub fn on_count_changed(&mut self, source: &Rc<Source>) {
        if self.destroyed {
            return;
        }
        let identity = self.identities.identify(source);
        let badge = self.prefs.current().badge_text(source.notification_count());
        let Some(icon) = self.icons.iter_mut().find(|icon| icon.identity == identity) else {
            return;
        };
        if icon.badge_handler.is_none() {
            return;
        }
        self.row.set_badge(&mut icon.widget, badge.as_deref());
        self.row.commit();
    }

    /// Re-read the do-not-disturb state, rebuilding the row if it changed.
    pub fn on_dnd_state_changed(&mut self) {
        if self.destroyed {
            return;
        }
        let dnd = DndState::from_banners_enabled(self.host.banners_enabled());
        if dnd != self.dnd {
            log::info!("do-not-disturb is now {}", if dnd.active { "active" } else { "inactive" });
            self.dnd = dnd;
            self.rebuild();
        }
    }

    /// Re-read the preferences and apply whatever changed.
    pub fn on_preference_changed(&mut self) -> RebuildDecision {
        if self.destroyed {
            return RebuildDecision::default();
        }
        let prefs = Preferences::load(&self.store);
        let decision = self.prefs.update(prefs);
        if decision.reposition {
            self.row.set_side(prefs.side());
        }
        if decision.rebuild {
            self.rebuild();
        } else if decision.reposition {
            self.row.commit();
        }
        decision
    }

    /// Ask the host to show the notifications behind the icon of `identity`.
    ///
    /// Returns false if no such icon is displayed.
    pub fn activate(&mut self, identity: &str) -> bool {
        if self.destroyed {
            return false;
        }
        match self.displayed_source(identity) {
            Some(source) => {
                self.host.show_banner(&source);
                true
            }
            None => false,
        }
    }

    /// Disconnect from everything and remove all icons. Calling this again does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        for id in self.host_handlers.drain(..) {
            self.host.disconnect(id);
        }
        for id in self.pref_handlers.drain(..) {
            self.store.disconnect(id);
        }
        for icon in self.icons.iter_mut() {
            if let Some(id) = icon.badge_handler.take() {
                self.host.disconnect(id);
            }
        }
        for icon in self.icons.drain(..) {
            self.row.remove_icon(icon.widget);
        }
        self.row.commit();
        log::debug!("notification icons destroyed");
    }

    /// Replace every icon with a freshly built one, for the sources the host currently lists.
    ///
    /// All new widgets are built before the old ones are torn down, and the row is committed
    /// once at the end.
    fn rebuild(&mut self) {
        let mut fresh: Vec<(DisplayedIcon<R::Icon>, Rc<Source>)> = Vec::new();
        for source in self.host.sources() {
            let identity = self.identities.identify(&source);
            if fresh.iter().any(|(icon, _)| icon.identity == identity) {
                continue;
            }
            if !self.passes_policy(&source) {
                continue;
            }
            if let Some(icon) = self.build_icon(&source, identity) {
                fresh.push((icon, source));
            }
        }

        let old = std::mem::take(&mut self.icons);
        for id in old.iter().filter_map(|icon| icon.badge_handler) {
            self.host.disconnect(id);
        }
        for icon in old {
            self.row.remove_icon(icon.widget);
        }

        for (index, (mut icon, source)) in fresh.into_iter().enumerate() {
            self.row.insert_icon(&icon.widget, index);
            icon.badge_handler = self.connect_badge(&source);
            self.icons.push(icon);
        }
        self.row.commit();
        log::debug!("rebuilt notification icons: {} shown", self.icons.len());
    }

    /// Add an icon for `source` unless it's hidden or already shown. Returns whether the row
    /// changed.
    fn add_source(&mut self, source: &Rc<Source>) -> bool {
        let identity = self.identities.identify(source);
        if self.position(&identity).is_some() {
            return false;
        }
        if !self.passes_policy(source) {
            log::debug!("not showing {} while do-not-disturb is active", identity);
            return false;
        }
        let Some(mut icon) = self.build_icon(source, identity) else {
            return false;
        };
        self.row.insert_icon(&icon.widget, self.icons.len());
        icon.badge_handler = self.connect_badge(source);
        log::debug!("added icon {}", icon.identity);
        self.icons.push(icon);
        true
    }

    fn build_icon(&mut self, source: &Rc<Source>, identity: SourceIdentity) -> Option<DisplayedIcon<R::Icon>> {
        let prefs = self.prefs.current();
        let pixel_size = prefs.icon_size.pixels();
        let spec = IconSpec {
            image: resolve_icon(source, pixel_size),
            pixel_size,
            desaturated: !prefs.colored_icons,
            badge: prefs.badge_text(source.notification_count()),
            identity,
        };
        match self.row.create_icon(&spec) {
            Ok(widget) => {
                Some(DisplayedIcon { identity: spec.identity, source: Rc::downgrade(source), widget, badge_handler: None })
            }
            Err(e) => {
                log::warn!("could not create icon for {}: {}", spec.identity, e);
                None
            }
        }
    }

    fn connect_badge(&mut self, source: &Rc<Source>) -> Option<HandlerId> {
        if self.prefs.current().notification_count {
            Some(self.host.connect(HostSignal::CountChanged(SourceKey::of(source))))
        } else {
            None
        }
    }

    /// Drop the badge subscription of `icon`, then the widget it refers to.
    fn teardown_icon(&mut self, icon: DisplayedIcon<R::Icon>) {
        if let Some(id) = icon.badge_handler {
            self.host.disconnect(id);
        }
        self.row.remove_icon(icon.widget);
    }

    /// Tear down the icon at `idx`, which belonged to `source`, and let another visible source
    /// with the same identity take it over. Does not commit.
    fn remove_icon_at(&mut self, idx: usize, source: &Rc<Source>) {
        let icon = self.icons.remove(idx);
        let identity = icon.identity.clone();
        self.teardown_icon(icon);
        log::debug!("removed icon {}", identity);

        for other in self.host.sources() {
            if Rc::ptr_eq(&other, source) || self.identities.identify(&other) != identity {
                continue;
            }
            if self.add_source(&other) {
                break;
            }
        }
    }

    fn passes_policy(&self, source: &Source) -> bool {
        should_show(source, self.dnd, self.prefs.current().dnd_mode)
    }

    fn position(&self, identity: &SourceIdentity) -> Option<usize> {
        self.icons.iter().position(|icon| &icon.identity == identity)
    }
}

impl<H: NotificationHost, S: PreferenceStore, R: IconRow> Drop for NotificationIcons<H, S, R> {
    fn drop(&mut self) {
        self.destroy();
    }
}
