use std::path::PathBuf;

use serde::Serialize;

use crate::*;

/// Themed icon shown for sources without any usable icon.
pub const FALLBACK_ICON_NAME: &str = "dialog-information-symbolic";

/// The image an icon widget should display, after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconImage {
    /// Themed icon names, most specific first.
    Themed(Vec<String>),
    File(PathBuf),
    Pixmap(Pixmap),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    #[error("themed icon without any names")]
    NoThemedNames,
    #[error("icon path {0:?} is not absolute")]
    RelativePath(PathBuf),
    #[error("no valid pixmap among {0}")]
    NoValidPixmap(usize),
}

/// From a list of pixmaps, pick the most appropriately sized one.
///
/// Takes the smallest one at least as big as requested, otherwise the biggest one. Pixmaps whose
/// data doesn't match their dimensions are ignored.
pub fn pick_pixmap(pixmaps: &[Pixmap], size: u32) -> Option<&Pixmap> {
    let wanted = u64::from(size) * u64::from(size);
    pixmaps.iter().filter(|p| p.is_valid()).max_by(|p1, p2| {
        let a1 = u64::from(p1.width) * u64::from(p1.height);
        let a2 = u64::from(p2.width) * u64::from(p2.height);
        match (a1 >= wanted, a2 >= wanted) {
            (true, true) => a2.cmp(&a1),
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => a1.cmp(&a2),
        }
    })
}

fn image_from_data(data: &IconData, size: u32) -> Result<IconImage, IconError> {
    match data {
        IconData::Themed(names) => {
            let names: Vec<String> = names.iter().filter(|n| !n.is_empty()).cloned().collect();
            if names.is_empty() {
                Err(IconError::NoThemedNames)
            } else {
                Ok(IconImage::Themed(names))
            }
        }
        IconData::File(path) if path.is_absolute() => Ok(IconImage::File(path.clone())),
        IconData::File(path) => Err(IconError::RelativePath(path.clone())),
        IconData::Pixmaps(pixmaps) => match pick_pixmap(pixmaps, size) {
            Some(p) => Ok(IconImage::Pixmap(p.clone())),
            None => Err(IconError::NoValidPixmap(pixmaps.len())),
        },
    }
}

/// Work out which image to show for `source`.
///
/// Tries, in order: the icons carried by its notifications, the icon of the source itself, the
/// icon of the application (by app id or policy id), and finally [`FALLBACK_ICON_NAME`]. Broken
/// icon data is logged and skipped.
pub fn resolve_icon(source: &Source, size: u32) -> IconImage {
    let notification_icons: Vec<IconData> = source.notifications().iter().filter_map(|n| n.icon.clone()).collect();
    let app_icon = source
        .app_id()
        .filter(|id| !id.is_empty())
        .or(source.policy_id().filter(|id| !id.is_empty() && *id != GENERIC_POLICY_ID))
        .map(|id| IconData::Themed(vec![id.to_owned()]));

    let candidates = notification_icons.iter().chain(source.icon()).chain(app_icon.as_ref());
    for data in candidates {
        match image_from_data(data, size) {
            Ok(image) => return image,
            Err(e) => log::warn!("skipping unusable icon of {:?}: {}", source.title().or(source.app_id()), e),
        }
    }
    IconImage::Themed(vec![FALLBACK_ICON_NAME.to_owned()])
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pixmap(size: u32) -> Pixmap {
        Pixmap { width: size, height: size, data: vec![0; (size * size * 4) as usize] }
    }

    fn themed(name: &str) -> IconImage {
        IconImage::Themed(vec![name.to_string()])
    }

    #[test]
    fn test_pick_pixmap() {
        let pixmaps = vec![pixmap(16), pixmap(64), pixmap(24), pixmap(32)];
        assert_eq!(pick_pixmap(&pixmaps, 18).map(|p| p.width), Some(24));
        assert_eq!(pick_pixmap(&pixmaps, 32).map(|p| p.width), Some(32));
        assert_eq!(pick_pixmap(&pixmaps, 128).map(|p| p.width), Some(64));
        assert_eq!(pick_pixmap(&[], 18), None);

        let broken = Pixmap { width: 48, height: 48, data: vec![0; 3] };
        assert_eq!(pick_pixmap(&[broken, pixmap(8)], 18).map(|p| p.width), Some(8));
    }

    #[test]
    fn test_chain_prefers_notification_icon() {
        let source = Source::new(SourceInfo {
            app_id: Some("mail".into()),
            icon: Some(IconData::Themed(vec!["mail-symbolic".into()])),
            ..Default::default()
        });
        assert_eq!(resolve_icon(&source, 18), themed("mail-symbolic"));

        source.push_notification(Notification::new(1, "no icon"));
        source.push_notification(Notification::new(2, "avatar").with_icon(IconData::File("/tmp/avatar.png".into())));
        assert_eq!(resolve_icon(&source, 18), IconImage::File("/tmp/avatar.png".into()));
    }

    #[test]
    fn test_chain_skips_broken_data() {
        let source = Source::new(SourceInfo {
            policy_id: Some("org.gnome.Calendar".into()),
            icon: Some(IconData::File("relative.png".into())),
            ..Default::default()
        });
        source.push_notification(Notification::new(1, "x").with_icon(IconData::Themed(vec![String::new()])));
        source.push_notification(Notification::new(2, "y").with_icon(IconData::Pixmaps(vec![])));
        assert_eq!(resolve_icon(&source, 18), themed("org.gnome.Calendar"));
    }

    #[test]
    fn test_empty_app_id_falls_back_to_policy_id() {
        let source = Source::new(SourceInfo {
            app_id: Some(String::new()),
            policy_id: Some("org.gnome.Calendar".into()),
            ..Default::default()
        });
        assert_eq!(resolve_icon(&source, 18), themed("org.gnome.Calendar"));

        let source = Source::new(SourceInfo { app_id: Some(String::new()), policy_id: Some(String::new()), ..Default::default() });
        assert_eq!(resolve_icon(&source, 18), themed(FALLBACK_ICON_NAME));
    }

    #[test]
    fn test_fallback_glyph() {
        let source = Source::new(SourceInfo { policy_id: Some(GENERIC_POLICY_ID.into()), ..Default::default() });
        assert_eq!(resolve_icon(&source, 18), themed(FALLBACK_ICON_NAME));
        let source = Source::new(SourceInfo { title: Some("Untitled".into()), ..Default::default() });
        assert_eq!(resolve_icon(&source, 18), themed(FALLBACK_ICON_NAME));
    }
}
