//! Policy: the rules a server applies on top of the two stores.
//!
//! The stores stay pure data structures. Admin bypass, the per-player lock
//! quota, the locking on/off switch and the retention window are all
//! decided here, from a [`GuardConfig`].

pub mod config;
pub mod protection;
pub mod retention;

pub use config::{CONFIG_FILE_NAME, ConfigError, GuardConfig};
pub use protection::{
    InteractionVerdict, RemovalVerdict, UnlockRejected, check_interaction, check_removal,
    request_lock, request_unlock,
};
pub use retention::{RetentionPolicy, RetentionSweeper};
