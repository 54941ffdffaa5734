//! Host side of desktab: the coordinator that owns tab mutations and page
//! injection, and an in-memory tab directory to run it against.
//!
//! The overlay never touches tabs itself.  It relays
//! [`OverlayRequest`](crate::message::OverlayRequest)s here, and the
//! [`Coordinator`](coordinator::Coordinator) applies them through a
//! [`TabDirectory`](crate::traits::TabDirectory) and pushes the refreshed
//! list back.

pub mod coordinator;
pub mod memory;
pub mod policy;
