//! # depsreg-client
//!
//! Read path to the published `index.json` for publishing workflows.
//!
//! Handles:
//! - **Fetch**: `GET <cdn>/index.json` with a fixed timeout, behind the
//!   [`IndexFetcher`] trait so tests can substitute an in-memory source.
//! - **Client**: a TTL cache with stale fallback, latest-version lookups,
//!   duplicate checks, and the `*` placeholder for unreachable lookups.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod client;
pub mod fetch;

pub use client::{DuplicateInfo, RegistryClient};
pub use fetch::{HttpIndexFetcher, IndexFetcher};
