//! A [`Relay`] that writes each request as one line of JSON.

use crate::message::OverlayRequest;
use crate::traits::Relay;
use log::debug;
use std::cell::RefCell;
use std::io::Write;

/// Errors produced by [`JsonLineRelay`].
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes every [`OverlayRequest`] to `writer`, newline-terminated, and
/// flushes so the host sees it immediately.
pub struct JsonLineRelay<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> JsonLineRelay<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> Relay for JsonLineRelay<W> {
    type Error = RelayError;

    fn send(&self, request: OverlayRequest) -> Result<(), RelayError> {
        let line = serde_json::to_string(&request)?;
        debug!("relay -> {}", line);
        let mut writer = self.writer.borrow_mut();
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{GroupId, TabId};

    #[test]
    fn writes_one_line_per_request() {
        let relay = JsonLineRelay::new(Vec::new());
        relay.send(OverlayRequest::CloseTab { tab_id: TabId(3) }).unwrap();
        relay
            .send(OverlayRequest::SwitchTab { tab_id: TabId(4), group_id: Some(GroupId(2)) })
            .unwrap();

        let out = String::from_utf8(relay.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: OverlayRequest = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, OverlayRequest::CloseTab { tab_id: TabId(3) });
        assert!(lines[1].contains(r#""type":"SWITCH_TAB""#));
        assert!(lines[1].contains(r#""groupId":2"#));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let relay = JsonLineRelay::new(ClosedPipe);
        assert!(matches!(
            relay.send(OverlayRequest::GetTabs),
            Err(RelayError::Io(_))
        ));
    }
}
