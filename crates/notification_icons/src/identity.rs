use std::{
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::{Source, SourceKey};

/// Policy id hosts hand out to every source without a real policy record. It does not identify
/// anything, so it is skipped during resolution.
pub const GENERIC_POLICY_ID: &str = "generic";

/// Stable identity of a source, used to key displayed icons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display, derive_more::From, serde::Serialize)]
#[serde(transparent)]
pub struct SourceIdentity(String);

impl SourceIdentity {
    fn generated(n: u64) -> Self {
        SourceIdentity(format!(":generated-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceIdentity {
    fn from(s: &str) -> Self {
        SourceIdentity(s.to_owned())
    }
}

impl PartialEq<str> for SourceIdentity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SourceIdentity {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Resolves [`SourceIdentity`]s.
///
/// Sources are identified by their policy id, app id or title, in that order. A source with none
/// of these is given a generated id, which is remembered for as long as that source instance is
/// alive. The resolver only holds weak references, so it never keeps a source alive.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    next_generated: u64,
    generated: HashMap<SourceKey, (Weak<Source>, SourceIdentity)>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identify(&mut self, source: &Rc<Source>) -> SourceIdentity {
        let policy_id = source.policy_id().filter(|id| *id != GENERIC_POLICY_ID);
        let named = [policy_id, source.app_id(), source.title()].into_iter().flatten().find(|s| !s.is_empty());
        match named {
            Some(name) => SourceIdentity(name.to_owned()),
            None => self.generated_for(source),
        }
    }

    fn generated_for(&mut self, source: &Rc<Source>) -> SourceIdentity {
        let key = SourceKey::of(source);
        if let Some((weak, identity)) = self.generated.get(&key) {
            // the allocation may have been reused by a new source since the old one died
            if weak.upgrade().is_some_and(|alive| Rc::ptr_eq(&alive, source)) {
                return identity.clone();
            }
        }

        self.generated.retain(|_, (weak, _)| weak.strong_count() > 0);
        self.next_generated += 1;
        let identity = SourceIdentity::generated(self.next_generated);
        self.generated.insert(key, (Rc::downgrade(source), identity.clone()));
        identity
    }
}
