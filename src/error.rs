use thiserror::Error;

use crate::models::BlockHeight;

/// Main error type for the transfer feed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Range too large: {0}")]
    RangeTooLarge(#[from] RangeTooLargeError),

    #[error("Decode mismatch in log {log_index} of block {block_number} (tx {transaction_hash}): {source}")]
    DecodeMismatch {
        block_number: BlockHeight,
        log_index: u32,
        transaction_hash: String,
        #[source]
        source: DecodeMismatchError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Network-level failures talking to the RPC endpoint
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {status}")]
    Status { status: u16 },
}

/// The endpoint answered, but not with something we can use
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("No result in response to {method}")]
    MissingResult { method: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid hex in field {field}: {value}")]
    InvalidHex { field: String, value: String },

    #[error("Log at block {block_number} is outside the requested range [{from_block}, {to_block}]")]
    LogOutOfRange {
        block_number: BlockHeight,
        from_block: BlockHeight,
        to_block: BlockHeight,
    },

    #[error("Log emitted by {got}, expected {expected}")]
    UnexpectedAddress { expected: String, got: String },
}

/// The endpoint refused the block span or result size of a log query
#[derive(Error, Debug)]
#[error("endpoint rejected block range [{from_block}, {to_block}]: {message}")]
pub struct RangeTooLargeError {
    pub from_block: BlockHeight,
    pub to_block: BlockHeight,
    pub code: Option<i64>,
    pub message: String,
}

/// A log whose shape disagrees with the declared event signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeMismatchError {
    #[error("expected {expected} topics, got {got}")]
    TopicCount { expected: usize, got: usize },

    #[error("event signature mismatch: expected={expected}, got={got}")]
    SignatureHash { expected: String, got: String },

    #[error("expected {expected} bytes of log data, got {got}")]
    DataLength { expected: usize, got: usize },

    #[error("address parameter `{name}` has nonzero upper padding bytes")]
    DirtyAddressPadding { name: String },

    #[error("event signature declares no parameter `{name}`")]
    MissingParameter { name: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid contract address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FeedError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Misconfiguration, nothing will work until fixed
    Critical,
    /// Signature/log disagreement or a broken endpoint
    High,
    /// Usually transient
    Medium,
    Low,
}

impl FeedError {
    /// Stable identifier for the error kind, used in logs and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "transport_error",
            FeedError::Protocol(_) => "protocol_error",
            FeedError::RangeTooLarge(_) => "range_too_large",
            FeedError::DecodeMismatch { .. } => "decode_mismatch",
            FeedError::Config(_) => "config_error",
            FeedError::Server(_) => "server_error",
        }
    }

    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FeedError::Config(_) => ErrorSeverity::Critical,
            FeedError::Server(_) => ErrorSeverity::Critical,
            FeedError::DecodeMismatch { .. } => ErrorSeverity::High,
            FeedError::Protocol(_) => ErrorSeverity::High,
            FeedError::Transport(_) => ErrorSeverity::Medium,
            FeedError::RangeTooLarge(_) => ErrorSeverity::Low,
        }
    }

    /// Whether repeating the same request later may succeed.
    /// Advisory only: nothing in this crate retries.
    pub fn is_recoverable(&self) -> bool {
        match self {
            FeedError::Transport(TransportError::Status { status }) => *status >= 500 || *status == 429,
            FeedError::Transport(_) => true,
            _ => false,
        }
    }

    /// Whether the caller should retry with a narrower block range
    pub fn should_narrow_range(&self) -> bool {
        matches!(self, FeedError::RangeTooLarge(_))
    }
}
