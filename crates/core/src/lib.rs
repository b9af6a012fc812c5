//! Kinniku Core - Shared types library.
//!
//! This crate provides common types used across all Kinniku admin components:
//! - `admin` - Administrative web console
//! - `cli` - Command-line tools for migrations, template seeding and roles
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Document ids, emails, roles, statuses and notification types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
