/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh)
/// - `tasks`: Task CRUD, assignment, and status endpoints

pub mod health;
pub mod auth;
pub mod tasks;
