//! Keeps a row of icons, one per notification source, in sync with a notification host.
//!
//! The host side (which sources exist, whether banners are enabled, where preferences live, and
//! how icons end up on screen) is abstracted behind [`NotificationHost`], [`PreferenceStore`] and
//! [`IconRow`]. [`NotificationIcons`] ties them together.

mod error;
pub use error::*;

mod host;
pub use host::*;

mod icon;
pub use icon::*;

mod identity;
pub use identity::*;

mod preferences;
pub use preferences::*;

mod reconciler;
pub use reconciler::*;

mod signals;
pub use signals::*;

mod source;
pub use source::*;

mod visibility;
pub use visibility::*;

#[cfg(test)]
mod test_support;
