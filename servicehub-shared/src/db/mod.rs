/// Database layer: connection pooling and embedded migrations
///
/// Models (SQL per entity) live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
