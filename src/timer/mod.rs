//! Keyed countdown timer core.
//!
//! This module contains the in-memory timer machinery:
//! - `state`: the `TimerState` tagged union published on each transition
//! - `ticker`: injectable tick scheduling (tokio-backed and manual)
//! - `instance`: one key's state machine bridged to a tick schedule
//! - `registry`: the key -> instance map and command routing

pub mod instance;
pub mod registry;
pub mod state;
pub mod ticker;

pub use instance::TimerInstance;
pub use registry::TimerRegistry;
pub use state::TimerState;
pub use ticker::{ManualTickScheduler, Tick, TickFn, TickHandle, TickScheduler, TokioTickScheduler};
