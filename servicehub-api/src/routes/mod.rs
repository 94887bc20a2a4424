/// API route handlers
///
/// Organized by resource:
///
/// - `health`: health check endpoint
/// - `auth`: registration, login, token refresh, current user
/// - `tags`, `components`: label listing and creation (shared code in `labels`)
/// - `services`: service CRUD and image upload

pub mod auth;
pub mod components;
pub mod health;
mod labels;
pub mod services;
pub mod tags;
