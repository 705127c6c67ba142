//! A headless windowing engine for very long, dynamically sized, incrementally loaded lists.
//!
//! For host-side utilities (scroll margin, idle detection, identity anchors, tweens), see the
//! `runway-adapter` crate.
//!
//! Only the nodes near the viewport exist at any time. The engine keeps an item table with
//! measured heights, converts scroll deltas into an anchor (item index + offset) instead of
//! trusting absolute offsets, recycles detached nodes through bounded pools, stands in
//! tombstones for data that has not arrived, and asks for more data exactly once per
//! horizon.
//!
//! It is UI-agnostic. The host provides:
//! - a [`ViewFactory`] that creates, binds, positions, measures and destroys nodes
//! - viewport scroll and resize events
//! - a commit signal once a layout has been rendered and sizes can be read
//! - data, through [`Change`] diffs or appends
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod extent;
mod factory;
mod fade;
mod fenwick;
mod items;
mod options;
mod pool;
mod range;
mod runway;
mod state;
mod types;

#[cfg(test)]
mod tests;

pub use anchor::{AnchorTracker, Heights};
pub use factory::ViewFactory;
pub use fade::{Easing, FadeFrame};
pub use items::Change;
pub use options::{OnExtentChange, OnLoadMore, RunwayOptions};
pub use pool::Pool;
pub use range::{LoadRequest, compute_fixed_range, compute_range};
pub use runway::Runway;
pub use state::RunwaySnapshot;
pub use types::{Anchor, AttachedRange, ItemId, NodeKind, PassReport, Size};
