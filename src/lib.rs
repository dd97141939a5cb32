pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod presentation;

pub use blockchain::{ChainClient, PipelineSettings, PipelineState, RpcClient, TransferDecoder, TransferPipeline};
pub use config::{ApiConfig, AppConfig, FetchConfig, LoggingConfig, RpcConfig, TokenConfig};
pub use error::{FeedError, Result};
pub use logging::{init_logging, ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{DecodedTransfer, TransferBatch};
pub use presentation::{HtmlTableSink, JsonSink, TransferSink};
