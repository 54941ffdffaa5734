//! Unix-socket [`InputSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Event`]: either a host
//! push (tagged with `type`) or user input from the surface.
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"type":"TOGGLE_OVERLAY","tabs":[{"id":1,"title":"Docs","url":"https://docs.rs","active":true,"groupId":1,"position":0}]}
//! {"Key":"ArrowRight"}
//! {"DragStart":{"index":0,"rects":[{"left":0,"top":0,"width":100,"height":80}]}}
//! {"DragOver":{"x":250.0,"y":40.0}}
//! "Drop"
//! ```

use crate::input::Event;
use crate::traits::InputSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`InputSource`] that listens on a Unix stream socket for
/// JSON-encoded events.
///
/// Each accepted connection can send any number of newline-delimited
/// events.  When the connection closes, the listener waits for the next
/// one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket listener.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnixSocketListener {
    /// Create a listener for `path`.
    ///
    /// The socket file is created when [`run`](InputSource::run) is called.
    /// A stale file left at `path` by an earlier run is replaced.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse one line of input.  Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Event>, SocketError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

impl InputSource for UnixSocketListener {
    type Error = SocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("accept error: {}", e);
                    continue;
                }
            };
            debug!("client connected");
            for line in BufReader::new(stream).lines() {
                let text = match line {
                    Ok(text) => text,
                    Err(e) => {
                        error!("read error: {}", e);
                        break;
                    }
                };
                match parse_line(&text) {
                    Ok(Some(event)) => {
                        debug!("received {:?}", event);
                        if sink.send(event).is_err() {
                            info!("sink closed, shutting down");
                            let _ = std::fs::remove_file(&self.path);
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => error!("bad event {:?}: {}", text, e),
                }
            }
            debug!("client disconnected");
        }
        Ok(())
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, Key};
    use crate::message::{HostMessage, TabId};
    use std::io::Write;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("desktab-test-{}-{}.sock", std::process::id(), id))
    }

    /// Start a listener on a fresh path and send `lines` over one connection.
    fn send_lines(lines: &[&str]) -> Vec<Event> {
        let path = tmp_socket_path();
        let path2 = path.clone();
        let (tx, rx) = mpsc::channel();

        let _handle = std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path2);
            let _ = listener.run(tx);
        });

        std::thread::sleep(Duration::from_millis(150));
        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            for line in lines {
                writeln!(stream, "{}", line).unwrap();
            }
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }
        std::thread::sleep(Duration::from_millis(150));

        let events = rx.try_iter().collect();
        let _ = std::fs::remove_file(&path);
        events
    }

    #[test]
    fn events_arrive_in_order() {
        let events = send_lines(&[
            r#"{"type":"TOGGLE_OVERLAY","tabs":[{"id":1,"title":"a","url":"https://a","active":true,"groupId":1,"position":0}]}"#,
            r#"{"Key":"ArrowRight"}"#,
            r#""Drop""#,
        ]);
        assert_eq!(events.len(), 3);
        match &events[0] {
            Event::Host(HostMessage::ToggleOverlay { tabs }) => assert_eq!(tabs[0].id, TabId(1)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[1], Event::Input(InputEvent::Key(Key::ArrowRight)));
        assert_eq!(events[2], Event::Input(InputEvent::Drop));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let events = send_lines(&["not json at all", "", r#"{"Key":"Escape"}"#]);
        assert_eq!(events, vec![Event::Input(InputEvent::Key(Key::Escape))]);
    }

    #[test]
    fn parse_line_handles_blank_and_bad_input() {
        assert!(matches!(parse_line("   "), Ok(None)));
        assert!(matches!(parse_line("{"), Err(SocketError::Json(_))));
        assert!(matches!(parse_line(r#""BackdropClick""#), Ok(Some(_))));
    }
}
