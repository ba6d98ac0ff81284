//! Thread ownership for the pipeline roles
//!
//! Each role (receive, drain, replay) runs on one [`PinnedWorker`]; the
//! component that owns it tracks a [`Lifecycle`] and shares a
//! [`StopToken`] with the thread body.

pub mod lifecycle;
pub mod pinned;

pub use lifecycle::{Lifecycle, LifecycleState, StopToken};
pub use pinned::PinnedWorker;
