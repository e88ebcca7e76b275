//! In-memory stand-ins for the host, the preference store and the icon row.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::*;

/// Log shared between a [`FakeHost`] and a [`RecordingRow`], to check the order of operations.
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub struct FakeHost {
    sources: Vec<Rc<Source>>,
    banners: Result<bool, HostError>,
    signals: SignalTable<HostSignal>,
    banners_shown: Vec<String>,
    log: EventLog,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            banners: Ok(true),
            signals: SignalTable::new(),
            banners_shown: Vec::new(),
            log: EventLog::default(),
        }
    }

    pub fn log(&self) -> EventLog {
        self.log.clone()
    }

    pub fn add(&mut self, info: SourceInfo) -> Rc<Source> {
        let source = Source::new(info);
        self.sources.push(source.clone());
        source
    }

    pub fn add_app(&mut self, app_id: &str) -> Rc<Source> {
        self.add(SourceInfo { app_id: Some(app_id.to_string()), ..Default::default() })
    }

    pub fn remove(&mut self, source: &Rc<Source>) {
        self.sources.retain(|s| !Rc::ptr_eq(s, source));
    }

    pub fn set_banners_enabled(&mut self, enabled: bool) {
        self.banners = Ok(enabled);
    }

    pub fn fail_banners_query(&mut self) {
        self.banners = Err(HostError::SettingUnavailable("show-banners".to_string()));
    }

    pub fn is_connected(&self, signal: HostSignal) -> bool {
        self.signals.is_connected(&signal)
    }

    pub fn handlers(&self) -> &SignalTable<HostSignal> {
        &self.signals
    }

    pub fn banners_shown(&self) -> Vec<String> {
        self.banners_shown.clone()
    }
}

impl NotificationHost for FakeHost {
    fn sources(&self) -> Vec<Rc<Source>> {
        self.sources.clone()
    }

    fn banners_enabled(&self) -> Result<bool, HostError> {
        self.banners.clone()
    }

    fn connect(&mut self, signal: HostSignal) -> HandlerId {
        let id = self.signals.connect(signal);
        self.log.borrow_mut().push(format!("connect {}", id));
        id
    }

    fn disconnect(&mut self, id: HandlerId) {
        self.signals.disconnect(id);
        self.log.borrow_mut().push(format!("disconnect {}", id));
    }

    fn show_banner(&mut self, source: &Source) {
        self.banners_shown.push(source.app_id().unwrap_or_default().to_string());
    }
}

#[derive(Debug, Clone, Copy)]
enum PrefValue {
    Bool(bool),
    Int(i32),
}

#[derive(Default)]
pub struct MemoryPreferences {
    values: HashMap<PrefKey, PrefValue>,
    signals: SignalTable<PrefKey>,
}

impl MemoryPreferences {
    pub fn handlers(&self) -> &SignalTable<PrefKey> {
        &self.signals
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: PrefKey) -> Result<bool, PrefError> {
        match self.values.get(&key) {
            Some(PrefValue::Bool(b)) => Ok(*b),
            Some(PrefValue::Int(_)) => Err(PrefError::WrongType { key, expected: "bool" }),
            None => Err(PrefError::Missing(key)),
        }
    }

    fn get_int(&self, key: PrefKey) -> Result<i32, PrefError> {
        match self.values.get(&key) {
            Some(PrefValue::Int(i)) => Ok(*i),
            Some(PrefValue::Bool(_)) => Err(PrefError::WrongType { key, expected: "int" }),
            None => Err(PrefError::Missing(key)),
        }
    }

    fn set_bool(&mut self, key: PrefKey, value: bool) -> Result<(), PrefError> {
        self.values.insert(key, PrefValue::Bool(value));
        Ok(())
    }

    fn set_int(&mut self, key: PrefKey, value: i32) -> Result<(), PrefError> {
        self.values.insert(key, PrefValue::Int(value));
        Ok(())
    }

    fn connect_changed(&mut self, key: PrefKey) -> HandlerId {
        self.signals.connect(key)
    }

    fn disconnect(&mut self, id: HandlerId) {
        self.signals.disconnect(id);
    }
}

/// What a [`RecordingRow`] shows for one icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowEntry {
    pub identity: String,
    pub pixel_size: u32,
    pub desaturated: bool,
    pub badge: Option<String>,
}

#[derive(Debug)]
pub struct RowIcon(u64);

/// An [`IconRow`] that keeps what it would display in memory.
pub struct RecordingRow {
    next_id: u64,
    staged: Vec<(u64, RowEntry)>,
    built: HashMap<u64, RowEntry>,
    commits: Vec<Vec<RowEntry>>,
    side: Option<Side>,
    created: usize,
    destroyed: usize,
    failing: Vec<String>,
    log: EventLog,
}

impl RecordingRow {
    pub fn new() -> Self {
        Self::with_log(EventLog::default())
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            next_id: 0,
            staged: Vec::new(),
            built: HashMap::new(),
            commits: Vec::new(),
            side: None,
            created: 0,
            destroyed: 0,
            failing: Vec::new(),
            log,
        }
    }

    /// Make icon creation fail for `identity`.
    pub fn fail_for(&mut self, identity: &str) {
        self.failing.push(identity.to_string());
    }

    /// The icons as of the last commit.
    pub fn committed(&self) -> Vec<RowEntry> {
        self.commits.last().cloned().unwrap_or_default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed
    }

    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl IconRow for RecordingRow {
    type Icon = RowIcon;

    fn create_icon(&mut self, spec: &IconSpec) -> Result<RowIcon, RowError> {
        if self.failing.iter().any(|f| spec.identity == f.as_str()) {
            return Err(RowError::InvalidIcon { identity: spec.identity.to_string(), reason: "told to fail".to_string() });
        }
        self.next_id += 1;
        self.created += 1;
        self.built.insert(
            self.next_id,
            RowEntry {
                identity: spec.identity.to_string(),
                pixel_size: spec.pixel_size,
                desaturated: spec.desaturated,
                badge: spec.badge.clone(),
            },
        );
        Ok(RowIcon(self.next_id))
    }

    fn insert_icon(&mut self, icon: &RowIcon, index: usize) {
        let entry = self.built[&icon.0].clone();
        self.staged.insert(index, (icon.0, entry));
    }

    fn remove_icon(&mut self, icon: RowIcon) {
        self.staged.retain(|(id, _)| *id != icon.0);
        if let Some(entry) = self.built.remove(&icon.0) {
            self.log.borrow_mut().push(format!("destroy {}", entry.identity));
        }
        self.destroyed += 1;
    }

    fn set_badge(&mut self, icon: &mut RowIcon, badge: Option<&str>) {
        for (id, entry) in self.staged.iter_mut() {
            if *id == icon.0 {
                entry.badge = badge.map(str::to_string);
            }
        }
    }

    fn set_side(&mut self, side: Side) {
        self.side = Some(side);
    }

    fn commit(&mut self) {
        self.commits.push(self.staged.iter().map(|(_, entry)| entry.clone()).collect());
    }
}
