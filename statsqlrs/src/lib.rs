pub mod backends;
pub mod config;
pub mod dialect;
pub mod error;
pub mod event_data;
pub mod executor;
pub mod filters;
pub mod gateway;
pub mod params;

pub use backends::BackendConnection;
pub use config::StatsqlConfig;
pub use dialect::{resolve_dialect, DatabaseKind, Dialect, ParamType, TimeUnit};
pub use error::{Result, StatsqlError};
pub use event_data::Aggregate;
pub use executor::{PendingQuery, QueryResult};
pub use filters::{build_filter_clause, FilterKey, FilterParts, FilterValue, Filters};
pub use gateway::QueryGateway;
pub use params::ParamList;
