/// Database models
///
/// One module per table family, each exposing its row type and the SQL that
/// reads and writes it.
///
/// # Models
///
/// - `user`: User accounts
/// - `label`: Tags and components (shared row shape, see `LabelKind`)
/// - `service`: Services and their tag/component links

pub mod label;
pub mod service;
pub mod user;
