//! # Taskboard Shared Library
//!
//! This crate contains the types and business logic shared between the
//! Taskboard API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, session tokens, tasks)
//! - `auth`: Authentication and authorization (JWT, passwords, permissions)
//! - `db`: Connection pool and migration helpers

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
