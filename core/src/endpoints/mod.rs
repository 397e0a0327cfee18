//! Typed wrappers for each backend resource family.
//!
//! Every function takes the shared `ApiClient` and returns the decoded
//! envelope. None of them retry or follow pagination; `page` and `per_page`
//! go to the backend exactly as given.

pub mod connectors;
pub mod models;
pub mod reports;
pub mod syncs;
