//! **desktab** — a keyboard- and drag-driven tab switcher overlay.
//!
//! Every open tab is shown as a card in a grid.  The user moves a selection
//! cursor with the arrow keys, switches with Enter, closes tabs, and drags
//! cards to reorder them.  The overlay never mutates tabs itself: it relays
//! requests to a host that owns the tab list and pushes the refreshed list
//! back.
//!
//! # Architecture
//!
//! The content side is one [`overlay::OverlayEngine`] that owns the
//! [`state::OverlayState`] and the optional [`drag::DragSession`].  It is
//! decoupled from its surroundings by the traits in [`traits`]:
//!
//! * [`traits::Relay`] carries requests to the host.
//! * [`traits::PageScroll`] locks scrolling of the page behind the overlay.
//! * [`traits::InputSource`] delivers [`input::Event`]s, e.g. from the Unix
//!   socket in [`ipc`].
//!
//! What to draw is computed by [`render::Frame::render`] and streamed to a
//! display surface as [`traits::SurfaceEvent`]s; [`surface`] contains a
//! headless one.
//!
//! The host side is [`host::coordinator::Coordinator`], generic over a
//! [`traits::TabDirectory`].  [`host::memory::MemoryDirectory`] implements
//! one in memory.

pub mod animation;
pub mod config;
pub mod drag;
pub mod host;
pub mod input;
pub mod ipc;
pub mod message;
pub mod overlay;
pub mod page;
pub mod render;
pub mod state;
pub mod surface;
pub mod traits;
