//! Shared API, exported to `tabnav-shell` and `tabnav`
//!
//! The tab data model, the persisted snapshot format, and the per-profile key/value contract are described in this crate.

pub mod config;
pub mod profile;
pub mod snapshot;
pub mod tab;
