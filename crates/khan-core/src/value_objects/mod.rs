//! Value objects - small immutable types shared by entities

mod levels;
mod metadata;
mod prune;
mod time;

pub use levels::MembershipLevels;
pub use metadata::{changed_keys, Metadata};
pub use prune::{PruneCounts, PruneOptions};
pub use time::{now_ms, Clock, ManualClock, SystemClock};
