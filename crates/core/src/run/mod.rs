//! Run lifecycle: `running` -> `completed` | `failed`.

mod tracker;
mod types;

pub use tracker::{ActiveRun, RunTracker, ORPHANED_REASON};
pub use types::*;
