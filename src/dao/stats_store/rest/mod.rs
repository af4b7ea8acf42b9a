//! Storage backend for a PostgREST-style hosted data API: one endpoint per
//! table under `/rest/v1`, equality filters in the query string, and
//! server-side procedures under `/rest/v1/rpc`.

mod config;
mod error;
mod models;
mod store;

pub use config::RestConfig;
pub use error::RestDaoError;
pub use store::RestStatsStore;
