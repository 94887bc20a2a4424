//! # ServiceHub Shared Library
//!
//! Types, persistence and business rules behind the ServiceHub API.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWT tokens, caller identity
//! - `db`: connection pool and embedded migrations
//! - `models`: database rows (users, tags, components, services)
//! - `catalog`: owner-scoped listing, service composition, image attachment
//! - `storage`: where uploaded images are kept

pub mod auth;
pub mod catalog;
pub mod db;
pub mod models;
pub mod storage;

/// Current version of the ServiceHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
