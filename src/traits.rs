//! Core traits that decouple desktab from any specific browser, page, or
//! transport.
//!
//! The [`OverlayEngine`](crate::overlay::OverlayEngine) only talks to a
//! [`Relay`] (to reach the host) and a [`PageScroll`] (to lock the page
//! behind the overlay).  The [`Coordinator`](crate::host::coordinator::Coordinator)
//! only talks to a [`TabDirectory`].  Events reach the engine from any
//! [`InputSource`].

use crate::drag::CardShift;
use crate::input::Event;
use crate::message::{GroupId, HostMessage, OverlayRequest, TabId, TabRecord};
use crate::render::Frame;
use std::sync::mpsc;

//  Relay

/// Carries [`OverlayRequest`]s from the overlay to the host.
///
/// Sending is fire-and-forget: the engine never waits for the mutation to
/// be applied.  The host answers by pushing a refreshed list later.
pub trait Relay {
    /// The error type produced by this relay.
    type Error: std::error::Error + Send + 'static;

    /// Hand `request` to the host.
    fn send(&self, request: OverlayRequest) -> Result<(), Self::Error>;
}

/// In-process relay: the receiving end is drained by whoever plays the host.
impl Relay for mpsc::Sender<OverlayRequest> {
    type Error = mpsc::SendError<OverlayRequest>;

    fn send(&self, request: OverlayRequest) -> Result<(), Self::Error> {
        mpsc::Sender::send(self, request)
    }
}

//  Page scroll lock

/// Element whose `overflow` style the overlay overrides while visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    /// `document.body`
    Body,
    /// `document.documentElement`
    Document,
}

/// Access to the inline `overflow` style of the page behind the overlay.
pub trait PageScroll {
    /// Current inline value (`""` when unset).
    fn overflow(&self, target: ScrollTarget) -> String;

    /// Replace the inline value.
    fn set_overflow(&self, target: ScrollTarget, value: &str);
}

//  Tab directory (host side)

/// Abstraction over the browser's tab API as seen by the host coordinator.
///
/// An implementation might wrap a real extension runtime, or it might be
/// the in-memory [`MemoryDirectory`](crate::host::memory::MemoryDirectory)
/// used by the simulator and tests.
pub trait TabDirectory {
    /// The error type produced by this directory.
    type Error: std::error::Error + Send + 'static;

    /// Every tab across every group, in group then position order.
    fn query_all(&self) -> Result<Vec<TabRecord>, Self::Error>;

    /// The active tab of the focused group, if any.
    fn active_tab(&self) -> Result<Option<TabRecord>, Self::Error>;

    /// Look up a single tab.
    fn get(&self, id: TabId) -> Result<Option<TabRecord>, Self::Error>;

    /// Close every tab in `ids`.
    fn remove(&self, ids: &[TabId]) -> Result<(), Self::Error>;

    /// Bring `group` to the front.
    fn focus_group(&self, group: GroupId) -> Result<(), Self::Error>;

    /// Make `id` the active tab of its group.
    fn activate(&self, id: TabId) -> Result<(), Self::Error>;

    /// Reposition `id` to `index` within `group`.
    fn move_tab(&self, id: TabId, group: GroupId, index: i64) -> Result<(), Self::Error>;

    /// Load the overlay into the page shown by tab `page`.
    fn inject(&self, page: TabId) -> Result<(), Self::Error>;

    /// Deliver `message` to the overlay running in `page`.  Fails if the
    /// page has no live overlay (never injected, or invalidated).
    fn deliver(&self, page: TabId, message: &HostMessage) -> Result<(), Self::Error>;

    /// Show `popup` instead of toggling the overlay when the user triggers
    /// desktab on `page`, or clear it with `None`.
    fn set_popup(&self, page: TabId, popup: Option<&str>) -> Result<(), Self::Error>;
}

//  Display surface

/// Events sent from the [`OverlayEngine`](crate::overlay::OverlayEngine) to
/// a display surface over an [`mpsc`](std::sync::mpsc) channel.
///
/// The engine owns the logical state; the surface only draws it.  It is up
/// to the surface to play the transitions and to install or remove its
/// keyboard listener on `Show` / `Hide`.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// Build the overlay from scratch and fade it in.
    Show { frame: Frame, fade_in_ms: u64 },
    /// Replace the whole card set (tab list changed or a drag ended).
    Render(Frame),
    /// The keyboard cursor moved; scroll the card into view.
    Select(usize),
    /// Glide the listed cards to their new offsets.
    Shift {
        shifts: Vec<CardShift>,
        duration_ms: u64,
    },
    /// Drop every drag transform immediately.
    ClearShifts,
    /// Play the exit transition, then remove the overlay.
    Hide { fade_out_ms: u64 },
}

//  Input source

/// A source of [`Event`]s.
///
/// Implementations listen on some transport (a Unix socket, a page bridge,
/// a test harness, …) and forward parsed events into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](InputSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once, in
///   arrival order.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait InputSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, Key};

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of events.
    struct MockSource {
        events: Vec<Event>,
    }

    impl InputSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), MockError> {
            for event in self.events.drain(..) {
                let _ = sink.send(event);
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_events_in_order() {
        let mut src = MockSource {
            events: vec![
                InputEvent::Key(Key::ArrowRight).into(),
                HostMessage::TabsUpdated { tabs: vec![] }.into(),
            ],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::Input(InputEvent::Key(Key::ArrowRight)));
        assert!(matches!(events[1], Event::Host(HostMessage::TabsUpdated { .. })));
    }

    #[test]
    fn channel_relay_forwards_requests() {
        let (tx, rx) = mpsc::channel();
        Relay::send(&tx, OverlayRequest::CloseTab { tab_id: TabId(4) }).unwrap();
        assert_eq!(rx.try_recv().unwrap(), OverlayRequest::CloseTab { tab_id: TabId(4) });
    }

    #[test]
    fn channel_relay_fails_when_host_is_gone() {
        let (tx, rx) = mpsc::channel::<OverlayRequest>();
        drop(rx);
        assert!(Relay::send(&tx, OverlayRequest::GetTabs).is_err());
    }
}
