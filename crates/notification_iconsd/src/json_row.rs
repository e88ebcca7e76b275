use std::{collections::HashMap, io::Write};

use notification_icons::{IconRow, IconSpec, RowError, Side};
use serde::Serialize;

/// Handle of an icon built by a [`JsonRow`].
#[derive(Debug)]
pub struct JsonIcon(u64);

#[derive(Serialize)]
struct RowLine<'a> {
    side: Side,
    icons: Vec<&'a IconSpec>,
}

/// An [`IconRow`] that writes the whole row as one line of JSON on every commit, for a bar to
/// render.
pub struct JsonRow {
    out: Box<dyn Write>,
    next_id: u64,
    built: HashMap<u64, IconSpec>,
    order: Vec<u64>,
    side: Side,
    last_line: Option<String>,
}

impl JsonRow {
    pub fn new(out: impl Write + 'static) -> Self {
        Self { out: Box::new(out), next_id: 0, built: HashMap::new(), order: Vec::new(), side: Side::Left, last_line: None }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    fn render(&self) -> serde_json::Result<String> {
        let icons = self.order.iter().filter_map(|id| self.built.get(id)).collect();
        serde_json::to_string(&RowLine { side: self.side, icons })
    }
}

impl IconRow for JsonRow {
    type Icon = JsonIcon;

    fn create_icon(&mut self, spec: &IconSpec) -> Result<JsonIcon, RowError> {
        if spec.pixel_size == 0 {
            return Err(RowError::InvalidIcon { identity: spec.identity.to_string(), reason: "zero pixel size".to_string() });
        }
        self.next_id += 1;
        self.built.insert(self.next_id, spec.clone());
        Ok(JsonIcon(self.next_id))
    }

    fn insert_icon(&mut self, icon: &JsonIcon, index: usize) {
        let index = index.min(self.order.len());
        self.order.insert(index, icon.0);
    }

    fn remove_icon(&mut self, icon: JsonIcon) {
        self.order.retain(|id| *id != icon.0);
        self.built.remove(&icon.0);
    }

    fn set_badge(&mut self, icon: &mut JsonIcon, badge: Option<&str>) {
        if let Some(spec) = self.built.get_mut(&icon.0) {
            spec.badge = badge.map(str::to_string);
        }
    }

    fn set_side(&mut self, side: Side) {
        self.side = side;
    }

    fn commit(&mut self) {
        let line = match self.render() {
            Ok(line) => line,
            Err(e) => {
                log::error!("failed to render icon row: {}", e);
                return;
            }
        };
        if self.last_line.as_ref() == Some(&line) {
            return;
        }
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            log::error!("failed to write icon row: {}", e);
            return;
        }
        self.last_line = Some(line);
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use notification_icons::{IconImage, SourceIdentity};
    use std::{cell::RefCell, rc::Rc};

    /// Collects everything written to it, readable while a [`JsonRow`] owns a clone.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn spec(identity: &str, image: IconImage) -> IconSpec {
        IconSpec { identity: SourceIdentity::from(identity), image, pixel_size: 18, desaturated: true, badge: None }
    }

    #[test]
    fn test_rendered_lines() {
        let buffer = SharedBuffer::default();
        let mut row = JsonRow::new(buffer.clone());
        let mut mail = row.create_icon(&spec("org.gnome.Evolution", IconImage::Themed(vec!["mail-unread".into()]))).unwrap();
        let chat = row.create_icon(&spec("Signal", IconImage::File("/tmp/signal.png".into()))).unwrap();
        row.insert_icon(&chat, 0);
        row.insert_icon(&mail, 0);
        row.set_badge(&mut mail, Some("3"));
        row.commit();
        row.commit();

        row.set_side(Side::Right);
        row.remove_icon(chat);
        row.commit();

        insta::assert_snapshot!(buffer.contents(), @r###"
        {"side":"left","icons":[{"identity":"org.gnome.Evolution","image":{"themed":["mail-unread"]},"pixel_size":18,"desaturated":true,"badge":"3"},{"identity":"Signal","image":{"file":"/tmp/signal.png"},"pixel_size":18,"desaturated":true,"badge":null}]}
        {"side":"right","icons":[{"identity":"org.gnome.Evolution","image":{"themed":["mail-unread"]},"pixel_size":18,"desaturated":true,"badge":"3"}]}
        "###);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let mut row = JsonRow::new(SharedBuffer::default());
        let spec = IconSpec { pixel_size: 0, ..spec("Signal", IconImage::Themed(vec!["signal".into()])) };
        assert!(matches!(row.create_icon(&spec), Err(RowError::InvalidIcon { .. })));
    }
}
