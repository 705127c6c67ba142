//! Viewport-observer utilities for the `runway` crate.
//!
//! The `runway` crate is UI-agnostic and reacts to discrete events. This crate provides the
//! small, framework-neutral pieces a host usually wraps around it:
//!
//! - A [`Controller`] that translates container offsets by a scroll margin, tracks whether the
//!   user is scrolling, and drives tween-based programmatic scrolling
//! - Identity-based scroll anchors that survive reorders
//! - A [`Tween`] helper
//!
//! This crate is intentionally framework-agnostic (no DOM/egui/ratatui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod controller;
mod tween;


pub use anchor::{ScrollAnchor, apply_anchor, capture_anchor};
pub use controller::{Controller, DEFAULT_IDLE_TIMEOUT_MS, ScrollPhase};
pub use runway::Easing;
pub use tween::Tween;
