//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `chrono`, `strum`).
//! Keep it lean: no I/O, networking, or heavy logic. Just data and simple helpers.

pub mod config;
pub mod features;
