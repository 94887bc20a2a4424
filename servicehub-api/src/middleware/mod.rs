/// Middleware modules for the API server
///
/// - `security`: security response headers
///
/// Bearer authentication lives in [`crate::app`] because it needs the
/// application state.

pub mod security;
