pub mod config;
pub mod logging;

pub mod aggregator;
pub mod api;
pub mod error;
pub mod http;
pub mod record;
pub mod sources;
pub mod update;

pub use error::StatsError;
