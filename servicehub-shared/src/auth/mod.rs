/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Access/refresh token issue and validation
/// - [`middleware`]: Caller identity (`AuthContext`) extracted from request headers

pub mod jwt;
pub mod middleware;
pub mod password;
