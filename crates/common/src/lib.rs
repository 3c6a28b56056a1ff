//! Shared types for the container audit workspace.

pub mod clock;
pub mod types;

pub use clock::{MILLIS_PER_DAY, days_to_millis, format_millis, now_millis};
pub use types::{BlockPos, ContainerKey, DEFAULT_DIMENSION, PlayerId};
