//! Comparison sessions: lockstep paging across queued albums.
//!
//! - `NavigationController` - sans-IO state machine (index, generation, fan-in)
//! - `ComparisonSession` - Tokio driver that runs the controller's loads

pub mod controller;
pub mod session;

pub use controller::{
    LoadBatch, LoadRequest, NavigationController, Phase, SessionError, SettleOutcome,
};
pub use session::{ComparisonSession, SessionState, Settlement};
