use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsqlError>;

#[derive(Debug, Error)]
pub enum StatsqlError {
    /// A fragment builder was asked to render for a database it has no dialect for.
    #[error("unsupported dialect: {0}")]
    UnsupportedDialect(String),
    /// The gateway could not resolve the database behind its connection string.
    #[error("unknown database")]
    UnknownDatabase,
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("invalid time unit: {0}")]
    InvalidTimeUnit(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("execution error: {0}")]
    Execution(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
