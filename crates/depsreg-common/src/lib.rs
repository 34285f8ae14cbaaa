//! # depsreg-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire depsreg workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the manifest and index models that the
//! analyzer, packager, and registry client all exchange.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod index;
pub mod manifest;
pub mod storage;
pub mod types;
