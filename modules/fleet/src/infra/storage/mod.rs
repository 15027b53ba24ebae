pub mod entity;
pub mod schema;

pub use schema::{fleet_backfill_spec, fleet_schema};
