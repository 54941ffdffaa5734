//! User input reported by the display surface, and the combined [`Event`]
//! stream the engine consumes.
//!
//! Keys are named after DOM `KeyboardEvent.key` values and parse
//! case-insensitively (`"ArrowRight"`, `"arrowright"`, `"arrow-right"`).
//! Any other key is kept as [`Key::Other`] so the engine can still swallow
//! it while the overlay is open.

use crate::drag::Rect;
use crate::message::HostMessage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A key press the overlay cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Enter,
    Delete,
    Backspace,
    Other(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Escape => write!(f, "Escape"),
            Key::ArrowLeft => write!(f, "ArrowLeft"),
            Key::ArrowRight => write!(f, "ArrowRight"),
            Key::ArrowUp => write!(f, "ArrowUp"),
            Key::ArrowDown => write!(f, "ArrowDown"),
            Key::Enter => write!(f, "Enter"),
            Key::Delete => write!(f, "Delete"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Parse a key name.  Never fails: unknown names become [`Key::Other`].
pub fn parse_key(s: &str) -> Key {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "escape" | "esc" => Key::Escape,
        "arrowleft" | "left" => Key::ArrowLeft,
        "arrowright" | "right" => Key::ArrowRight,
        "arrowup" | "up" => Key::ArrowUp,
        "arrowdown" | "down" => Key::ArrowDown,
        "enter" | "return" => Key::Enter,
        "delete" | "del" => Key::Delete,
        "backspace" => Key::Backspace,
        _ => Key::Other(s.trim().to_string()),
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(parse_key(&s))
    }
}

/// Interaction reported by the display surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// A key was pressed while the page had focus.
    Key(Key),
    /// The card at display `index` was clicked.
    CardClick { index: usize },
    /// The close button of the card at display `index` was clicked.
    CloseClick { index: usize },
    /// The "Close All" button was clicked.
    CloseAllClick,
    /// The dimmed area around the grid was clicked.
    BackdropClick,
    /// A drag gesture started on the card at `index`.  `rects` holds the
    /// bounding box of every displayed card, in display order, measured
    /// once at drag start.
    DragStart { index: usize, rects: Vec<Rect> },
    /// The pointer moved over the grid during a drag.
    DragOver { x: f64, y: f64 },
    /// The dragged card was released over the grid.
    Drop,
    /// The drag gesture ended, with or without a drop.
    DragEnd,
    /// The grid's inner width changed (pixels).
    Resize { grid_width: f64 },
}

/// Everything the engine reacts to, in arrival order.
///
/// On the wire a host message is recognised by its `type` field; anything
/// else is parsed as an [`InputEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    Host(HostMessage),
    Input(InputEvent),
}

impl From<HostMessage> for Event {
    fn from(msg: HostMessage) -> Self {
        Event::Host(msg)
    }
}

impl From<InputEvent> for Event {
    fn from(input: InputEvent) -> Self {
        Event::Input(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_parse_loosely() {
        assert_eq!(parse_key("ArrowRight"), Key::ArrowRight);
        assert_eq!(parse_key("arrow-left"), Key::ArrowLeft);
        assert_eq!(parse_key(" ESC "), Key::Escape);
        assert_eq!(parse_key("Backspace"), Key::Backspace);
        assert_eq!(parse_key("q"), Key::Other("q".into()));
    }

    #[test]
    fn key_display_round_trips_dom_names() {
        for key in [
            Key::Escape,
            Key::ArrowLeft,
            Key::ArrowRight,
            Key::ArrowUp,
            Key::ArrowDown,
            Key::Enter,
            Key::Delete,
            Key::Backspace,
        ] {
            assert_eq!(parse_key(&key.to_string()), key);
        }
    }

    #[test]
    fn input_events_from_json() {
        let e: InputEvent = serde_json::from_str(r#"{"Key":"Enter"}"#).unwrap();
        assert_eq!(e, InputEvent::Key(Key::Enter));

        let e: InputEvent = serde_json::from_str(r#""Drop""#).unwrap();
        assert_eq!(e, InputEvent::Drop);

        let e: InputEvent = serde_json::from_str(
            r#"{"DragStart":{"index":1,"rects":[{"left":0,"top":0,"width":10,"height":10}]}}"#,
        )
        .unwrap();
        match e {
            InputEvent::DragStart { index, rects } => {
                assert_eq!(index, 1);
                assert_eq!(rects.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn event_distinguishes_host_messages_from_input() {
        let e: Event = serde_json::from_str(r#"{"type":"TABS_UPDATED","tabs":[]}"#).unwrap();
        assert!(matches!(e, Event::Host(HostMessage::TabsUpdated { .. })));

        let e: Event = serde_json::from_str(r#"{"DragOver":{"x":1.5,"y":2.0}}"#).unwrap();
        assert_eq!(e, Event::Input(InputEvent::DragOver { x: 1.5, y: 2.0 }));

        let e: Event = serde_json::from_str(r#""BackdropClick""#).unwrap();
        assert_eq!(e, Event::Input(InputEvent::BackdropClick));
    }
}
