//! Tab snapshots and the message-relay vocabulary.
//!
//! This module defines the types that both halves of desktab share:
//! [`TabRecord`] is the per-tab snapshot the host hands to the overlay,
//! [`HostMessage`] is what the host pushes to the overlay, and
//! [`OverlayRequest`] is what the overlay asks the host to do.
//!
//! Messages are internally tagged by a `type` field whose value is the
//! SCREAMING_SNAKE_CASE message name, e.g.
//!
//! ```json
//! {"type":"TABS_UPDATED","tabs":[{"id":7,"title":"Docs","url":"https://docs.rs","active":true,"groupId":1,"position":0}]}
//! {"type":"MOVE_TAB","tabId":7,"groupId":1,"newIndex":3}
//! {"type":"CLOSE_ALL_TABS"}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque host handle for a tab.  Unique across the full list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Handle for the window / container a tab belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Immutable snapshot of one tab as reported by the host.
///
/// `position` is the host-assigned order of the tab inside its group.  It is
/// what [`OverlayRequest::MoveTab`] targets, and is independent of the
/// overlay's own display index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Favicon reference.  The host sends `""` for tabs without one, which
    /// is read as absent.
    #[serde(
        default,
        alias = "favIconUrl",
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon_ref: Option<String>,
    #[serde(rename = "active", default)]
    pub is_active: bool,
    #[serde(alias = "windowId")]
    pub group_id: GroupId,
    #[serde(alias = "index")]
    pub position: i64,
}

fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

impl TabRecord {
    /// Title to display, falling back to `"Untitled"`.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

/// Messages pushed from the host to the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    /// Show the overlay with `tabs`, or hide it if it is already visible.
    ToggleOverlay { tabs: Vec<TabRecord> },
    /// The tab list changed while the overlay may be visible.
    TabsUpdated { tabs: Vec<TabRecord> },
}

/// Requests sent from the overlay to the host.
///
/// Apart from [`GetTabs`](OverlayRequest::GetTabs) every request is
/// fire-and-forget: the host answers mutations by pushing a later
/// [`HostMessage::TabsUpdated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum OverlayRequest {
    /// Close one tab.
    CloseTab { tab_id: TabId },
    /// Activate a tab, focusing its group first when known.
    SwitchTab {
        tab_id: TabId,
        #[serde(alias = "windowId", default, skip_serializing_if = "Option::is_none")]
        group_id: Option<GroupId>,
    },
    /// Close every tab except the one hosting the overlay.
    CloseAllTabs,
    /// Move a tab to `new_index` (a host position) inside `group_id`.
    MoveTab {
        tab_id: TabId,
        #[serde(alias = "windowId")]
        group_id: GroupId,
        new_index: i64,
    },
    /// Ask for the current tab list; answered directly with [`TabsReply`].
    GetTabs,
}

impl fmt::Display for OverlayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayRequest::CloseTab { tab_id } => write!(f, "close {}", tab_id),
            OverlayRequest::SwitchTab { tab_id, group_id: Some(g) } => {
                write!(f, "switch to {} in {}", tab_id, g)
            }
            OverlayRequest::SwitchTab { tab_id, group_id: None } => write!(f, "switch to {}", tab_id),
            OverlayRequest::CloseAllTabs => write!(f, "close all tabs"),
            OverlayRequest::MoveTab {
                tab_id,
                group_id,
                new_index,
            } => write!(f, "move {} to {} in {}", tab_id, new_index, group_id),
            OverlayRequest::GetTabs => write!(f, "get tabs"),
        }
    }
}

/// Direct reply to [`OverlayRequest::GetTabs`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabsReply {
    pub tabs: Vec<TabRecord>,
}

#[cfg(test)]
pub(crate) fn tab(id: u64, group: u64, position: i64) -> TabRecord {
    TabRecord {
        id: TabId(id),
        title: format!("Tab {}", id),
        url: format!("https://example.com/{}", id),
        icon_ref: None,
        is_active: false,
        group_id: GroupId(group),
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_payload_with_legacy_keys() {
        let json = r#"{
            "id": 12,
            "title": "",
            "url": "https://example.com",
            "favIconUrl": "",
            "active": true,
            "windowId": 3,
            "index": 4
        }"#;
        let t: TabRecord = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, TabId(12));
        assert_eq!(t.group_id, GroupId(3));
        assert_eq!(t.position, 4);
        assert!(t.is_active);
        assert_eq!(t.icon_ref, None, "empty favicon means no icon");
        assert_eq!(t.display_title(), "Untitled");
    }

    #[test]
    fn tab_record_serializes_camel_case() {
        let mut t = tab(1, 2, 0);
        t.icon_ref = Some("https://example.com/favicon.ico".into());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["groupId"], 2);
        assert_eq!(v["iconRef"], "https://example.com/favicon.ico");
        assert_eq!(v["active"], false);
        assert_eq!(v["position"], 0);
    }

    #[test]
    fn host_message_tags() {
        let msg: HostMessage =
            serde_json::from_str(r#"{"type":"TABS_UPDATED","tabs":[]}"#).unwrap();
        assert_eq!(msg, HostMessage::TabsUpdated { tabs: vec![] });

        let v = serde_json::to_value(HostMessage::ToggleOverlay { tabs: vec![] }).unwrap();
        assert_eq!(v["type"], "TOGGLE_OVERLAY");
    }

    #[test]
    fn overlay_request_wire_names() {
        let v = serde_json::to_value(OverlayRequest::MoveTab {
            tab_id: TabId(7),
            group_id: GroupId(1),
            new_index: 3,
        })
        .unwrap();
        assert_eq!(v["type"], "MOVE_TAB");
        assert_eq!(v["tabId"], 7);
        assert_eq!(v["groupId"], 1);
        assert_eq!(v["newIndex"], 3);

        let v = serde_json::to_value(OverlayRequest::CloseAllTabs).unwrap();
        assert_eq!(v, serde_json::json!({ "type": "CLOSE_ALL_TABS" }));
    }

    #[test]
    fn switch_tab_accepts_window_id_alias() {
        let req: OverlayRequest =
            serde_json::from_str(r#"{"type":"SWITCH_TAB","tabId":5,"windowId":2}"#).unwrap();
        assert_eq!(
            req,
            OverlayRequest::SwitchTab {
                tab_id: TabId(5),
                group_id: Some(GroupId(2)),
            }
        );
    }

    #[test]
    fn request_display() {
        assert_eq!(OverlayRequest::CloseTab { tab_id: TabId(3) }.to_string(), "close tab#3");
        assert_eq!(OverlayRequest::GetTabs.to_string(), "get tabs");
    }
}
