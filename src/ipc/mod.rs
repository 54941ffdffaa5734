//! Line-oriented JSON transport.
//!
//! The daemon reads [`Event`](crate::input::Event)s from a Unix socket and
//! writes the overlay's requests back out, one JSON object per line.

pub mod listener;
pub mod relay;
