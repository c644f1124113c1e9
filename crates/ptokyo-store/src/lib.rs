// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client state for Parallel Tokyo.
//!
//! - [`Store`] holds the canvas and presence state and runs the optimistic actions.
//! - [`RealtimeBridge`] feeds remote changes into a store while a view is mounted.
//! - [`presence::project`] places users on screen from their id alone.

pub mod optimistic;
pub mod presence;
pub mod realtime;
pub mod state;
pub mod store;

pub use optimistic::{PendingWrite, WriteState};
pub use presence::{ScreenPoint, is_active, project};
pub use realtime::{BridgeHandle, ChangeEvent, RealtimeBridge, apply_change};
pub use state::{AppMode, CanvasState, StoreEvent};
pub use store::{MAX_INTENSITY, Store, StoreSettings};
