//! Kernel utilities shared across slices.
//! Keep this crate lightweight; it re-exports ergonomic helpers for config loading.
//!
//! ## Config loading
//! ```rust,ignore
//! use rollout_kernel::config::load_config;
//! let cfg: rollout_kernel::domain::config::AppConfig =
//!     load_config::<_>(Some("rollout")).unwrap_or_default();
//! ```
pub mod config;

pub use rollout_domain as domain;
