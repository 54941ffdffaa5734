//! The content-side engine that ties the overlay state, drag geometry,
//! relay and display surface together.
//!
//! [`OverlayEngine`] owns the [`OverlayState`] and the optional
//! [`DragSession`], reacts to [`Event`]s, sends [`OverlayRequest`]s through
//! a [`Relay`] and describes what to draw with [`SurfaceEvent`]s.
//!
//! The engine never edits its tab list in response to its own requests.
//! A close or move only takes effect on screen once the host pushes the
//! refreshed list, so a failed or raced mutation cannot leave the overlay
//! out of sync with the browser.

use crate::config::OverlayConfig;
use crate::drag::{DragSession, Rect};
use crate::input::{Event, InputEvent, Key};
use crate::message::{HostMessage, OverlayRequest, TabRecord};
use crate::page::ScrollLock;
use crate::render::Frame;
use crate::state::OverlayState;
use crate::traits::{PageScroll, Relay, SurfaceEvent};
use log::{debug, info, warn};
use std::sync::mpsc;

/// Possible errors from the engine.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// The relay could not hand a request to the host.
    #[error("relay error: {0}")]
    Relay(String),
}

/// The overlay's single owner of state.
///
/// Generic over the [`Relay`] that reaches the host and the [`PageScroll`]
/// of the page behind the overlay.
///
/// # Typical usage
///
/// ```ignore
/// let mut engine = OverlayEngine::new(relay, InMemoryPage::new(), OverlayConfig::default());
/// engine.set_surface(surface_tx);
/// engine.handle(HostMessage::ToggleOverlay { tabs }.into())?;
/// engine.handle(InputEvent::Key(Key::ArrowRight).into())?;
/// ```
pub struct OverlayEngine<R: Relay, P: PageScroll> {
    relay: R,
    page: P,
    state: OverlayState,
    drag: Option<DragSession>,
    scroll: ScrollLock,
    /// Column count derived from the last reported grid width.
    columns: Option<usize>,
    config: OverlayConfig,
    surface_tx: Option<mpsc::Sender<SurfaceEvent>>,
}

impl<R: Relay, P: PageScroll> OverlayEngine<R, P> {
    /// Create a hidden engine with an empty tab list.
    pub fn new(relay: R, page: P, config: OverlayConfig) -> Self {
        Self {
            relay,
            page,
            state: OverlayState::new(),
            drag: None,
            scroll: ScrollLock::new(),
            columns: None,
            config,
            surface_tx: None,
        }
    }

    /// Attach a display surface channel.
    ///
    /// Without one the engine still tracks state and sends requests; it
    /// just has nobody to describe the view to.
    pub fn set_surface(&mut self, tx: mpsc::Sender<SurfaceEvent>) {
        self.surface_tx = Some(tx);
    }

    //  Accessors

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible()
    }

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Columns used for up/down movement.
    pub fn columns(&self) -> usize {
        self.columns.unwrap_or(self.config.default_columns).max(1)
    }

    /// The current view.
    pub fn frame(&self) -> Frame {
        Frame::render(&self.state, self.drag.as_ref(), &self.config)
    }

    //  Dispatch

    /// Process a single [`Event`].
    ///
    /// Returns an error only if a request could not be relayed.  State has
    /// already been updated consistently by then (the overlay still hides on
    /// a failed switch, a failed drop still clears its shifts); the caller
    /// just logs it.
    pub fn handle(&mut self, event: Event) -> Result<(), OverlayError> {
        match event {
            Event::Host(msg) => {
                self.handle_message(msg);
                Ok(())
            }
            Event::Input(input) => self.handle_input(input),
        }
    }

    /// React to a push from the host.
    pub fn handle_message(&mut self, msg: HostMessage) {
        match msg {
            HostMessage::ToggleOverlay { tabs } => {
                debug!("toggle ({} tabs)", tabs.len());
                self.toggle(tabs);
            }
            HostMessage::TabsUpdated { tabs } => {
                debug!("tabs updated ({} tabs)", tabs.len());
                self.refresh(tabs);
            }
        }
    }

    /// React to user input from the surface.
    pub fn handle_input(&mut self, input: InputEvent) -> Result<(), OverlayError> {
        if let InputEvent::Resize { grid_width } = input {
            let columns = self.config.columns_for_width(grid_width);
            debug!("grid width {:.0}px -> {} columns", grid_width, columns);
            self.columns = Some(columns);
            return Ok(());
        }
        if !self.state.is_visible() {
            debug!("overlay hidden, ignoring {:?}", input);
            return Ok(());
        }
        match input {
            InputEvent::Key(key) => {
                self.handle_key(key)?;
            }
            InputEvent::CardClick { index } => self.switch_to(index)?,
            InputEvent::CloseClick { index } => self.close(index)?,
            InputEvent::CloseAllClick => {
                info!("close all tabs");
                self.send(OverlayRequest::CloseAllTabs)?;
            }
            InputEvent::BackdropClick => self.hide(),
            InputEvent::DragStart { index, rects } => {
                self.begin_drag(index, rects);
            }
            InputEvent::DragOver { x, y } => self.update_drag(x, y),
            InputEvent::Drop => self.end_drag(true)?,
            InputEvent::DragEnd => self.end_drag(false)?,
            InputEvent::Resize { .. } => {}
        }
        Ok(())
    }

    //  Lifecycle

    /// Show the overlay, or hide it if it is already shown.
    pub fn toggle(&mut self, tabs: Vec<TabRecord>) {
        self.show(tabs);
    }

    /// Show the overlay with `tabs`, selecting the active tab.
    ///
    /// Showing an overlay that is already visible is the second half of a
    /// toggle and hides it instead.
    pub fn show(&mut self, tabs: Vec<TabRecord>) {
        if self.state.is_visible() {
            self.hide();
            return;
        }
        info!("show overlay ({} tabs)", tabs.len());
        self.drag = None;
        self.state.init_selection(tabs);
        self.state.set_visible(true);
        self.scroll.lock(&self.page);
        let frame = self.frame();
        self.emit(SurfaceEvent::Show {
            frame,
            fade_in_ms: self.config.fade_in_ms,
        });
        if !self.state.is_empty() {
            self.emit(SurfaceEvent::Select(self.state.selected_index()));
        }
    }

    /// Hide the overlay and give the page its scrolling back.  No-op when
    /// already hidden.
    pub fn hide(&mut self) {
        if !self.state.is_visible() {
            return;
        }
        info!("hide overlay");
        if self.drag.take().is_some() {
            self.emit(SurfaceEvent::ClearShifts);
        }
        self.state.set_visible(false);
        self.scroll.unlock(&self.page);
        self.emit(SurfaceEvent::Hide {
            fade_out_ms: self.config.fade_out_ms,
        });
    }

    /// Replace the tab list after an external change.
    ///
    /// Ignored while hidden; the next toggle brings a fresh list anyway.
    /// An empty list closes the overlay.
    pub fn refresh(&mut self, tabs: Vec<TabRecord>) {
        if !self.state.is_visible() {
            debug!("overlay hidden, ignoring tab update");
            return;
        }
        if self.drag.take().is_some() {
            debug!("tab list changed mid-drag, dropping drag session");
            self.emit(SurfaceEvent::ClearShifts);
        }
        if !self.state.on_list_changed(tabs) {
            info!("no tabs left");
            self.hide();
            return;
        }
        let frame = self.frame();
        self.emit(SurfaceEvent::Render(frame));
        self.emit(SurfaceEvent::Select(self.state.selected_index()));
    }

    //  Keyboard

    /// Handle a key press.
    ///
    /// Returns whether the key was consumed.  While the overlay is visible
    /// every key is consumed so the page underneath never sees it; while a
    /// drag is active, or the overlay is hidden, keys are left alone.
    pub fn handle_key(&mut self, key: Key) -> Result<bool, OverlayError> {
        if !self.state.is_visible() {
            return Ok(false);
        }
        if self.drag.is_some() {
            debug!("drag in progress, ignoring {}", key);
            return Ok(false);
        }
        if self.state.is_empty() {
            if key == Key::Escape {
                self.hide();
            }
            return Ok(true);
        }

        let columns = self.columns();
        match key {
            Key::Escape => self.hide(),
            Key::ArrowRight => {
                let idx = self.state.move_next();
                self.emit(SurfaceEvent::Select(idx));
            }
            Key::ArrowLeft => {
                let idx = self.state.move_prev();
                self.emit(SurfaceEvent::Select(idx));
            }
            Key::ArrowDown => {
                let idx = self.state.move_down(columns);
                self.emit(SurfaceEvent::Select(idx));
            }
            Key::ArrowUp => {
                let idx = self.state.move_up(columns);
                self.emit(SurfaceEvent::Select(idx));
            }
            Key::Enter => self.switch_to(self.state.selected_index())?,
            Key::Delete | Key::Backspace => self.close(self.state.selected_index())?,
            Key::Other(_) => {}
        }
        debug!("selected {}", self.state.selected_index());
        Ok(true)
    }

    //  Drag and drop

    /// Start dragging the card at `index`.  `rects` is the bounding box of
    /// every displayed card, measured now and never again for this drag.
    ///
    /// Returns `false` (and does nothing) if fewer than two tabs are shown,
    /// the index is out of range, or a drag is already running.
    pub fn begin_drag(&mut self, index: usize, rects: Vec<Rect>) -> bool {
        if self.state.len() < 2 {
            debug!("drag ignored: fewer than two tabs");
            return false;
        }
        if self.drag.is_some() {
            warn!("drag start while dragging, ignoring");
            return false;
        }
        let Some(tab) = self.state.tabs().get(index) else {
            debug!("drag ignored: no card at {}", index);
            return false;
        };
        debug!("drag start: card {} ({})", index, tab.id);
        self.drag = Some(DragSession::begin(index, tab.id, rects));
        true
    }

    /// Track the pointer during a drag.
    pub fn update_drag(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if let Some(shifts) = drag.update(x, y) {
            debug!("drag target -> {}", drag.target_index());
            self.emit(SurfaceEvent::Shift {
                shifts,
                duration_ms: self.config.shift_animation_ms,
            });
        }
    }

    /// Finish the drag.  With `commit`, a drop on a different card asks the
    /// host to move the dragged tab to that card's host position.  The
    /// shifts are cleared and the session is gone either way.
    pub fn end_drag(&mut self, commit: bool) -> Result<(), OverlayError> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.emit(SurfaceEvent::ClearShifts);

        if !commit {
            debug!("drag cancelled");
            return Ok(());
        }
        if !drag.moved() {
            debug!("dropped in place, nothing to move");
            return Ok(());
        }

        let tabs = self.state.tabs();
        let (Some(dragged), Some(target)) = (
            tabs.get(drag.source_index()),
            tabs.get(drag.target_index()),
        ) else {
            warn!("drop target out of range, ignoring");
            return Ok(());
        };
        let request = OverlayRequest::MoveTab {
            tab_id: dragged.id,
            group_id: dragged.group_id,
            new_index: target.position,
        };
        info!(
            "drop: card {} -> {} ({})",
            drag.source_index(),
            drag.target_index(),
            request
        );
        self.send(request)
    }

    //  Helpers

    /// Ask the host to activate the tab at `index`, then hide.
    fn switch_to(&mut self, index: usize) -> Result<(), OverlayError> {
        let Some(tab) = self.state.tabs().get(index) else {
            return Ok(());
        };
        let request = OverlayRequest::SwitchTab {
            tab_id: tab.id,
            group_id: Some(tab.group_id),
        };
        info!("{}", request);
        let sent = self.send(request);
        self.hide();
        sent
    }

    /// Ask the host to close the tab at `index`.
    fn close(&mut self, index: usize) -> Result<(), OverlayError> {
        let Some(tab) = self.state.tabs().get(index) else {
            return Ok(());
        };
        let request = OverlayRequest::CloseTab { tab_id: tab.id };
        info!("{}", request);
        self.send(request)
    }

    fn send(&self, request: OverlayRequest) -> Result<(), OverlayError> {
        self.relay
            .send(request)
            .map_err(|e| OverlayError::Relay(e.to_string()))
    }

    fn emit(&self, event: SurfaceEvent) {
        if let Some(tx) = &self.surface_tx {
            let _ = tx.send(event);
        }
    }
}

//  Tests
