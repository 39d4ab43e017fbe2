use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Ingestion batch is empty")]
    EmptyBatch,

    #[error("Corrupt series data: {0}")]
    CorruptData(String),

    #[error("Store IO error: {0}")]
    StoreIo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type alias for reportchart operations
pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Creates a new corrupt data error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::CorruptData(msg.into())
    }

    /// Creates a new store IO error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::StoreIo(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Returns true if retrying on the next poll tick may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(_) | Self::StoreIo(_) | Self::EmptyBatch => true,
            Self::Io(_) | Self::Join(_) => true,
            Self::CorruptData(_) | Self::Config(_) | Self::Serialization(_) => false,
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "ingest",
            Self::CorruptData(_) => "corrupt",
            Self::StoreIo(_) => "store",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Join(_) => "async",
        }
    }
}

// Every redb failure surfaces as a store IO error.
macro_rules! store_error_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for ReportError {
                fn from(e: $err) -> Self {
                    Self::StoreIo(redb::Error::from(e).to_string())
                }
            }
        )*
    };
}

store_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl From<redb::Error> for ReportError {
    fn from(e: redb::Error) -> Self {
        Self::StoreIo(e.to_string())
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
