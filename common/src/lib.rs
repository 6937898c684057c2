//! # asnscope common
//!
//! Types shared by the scanning engine and its front ends:
//!
//! * **[`network::target`]**: parsing of seed targets (ASN labels, bare IPv4 hosts).
//! * **[`config`]**: run configuration and output destinations.
//! * **[`event`]**: the status events a running scan reports.
//! * **[`utils::progress`]**: completion fraction and ETA arithmetic.
//!
//! The crate also exports the `info!`, `success!`, `warn!` and `error!` logging
//! macros used across the workspace.

pub mod config;
pub mod event;
pub mod network;
pub mod utils;

mod macros;

pub use macros::{PRINT_TARGET, SUCCESS_TARGET};

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
