use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;

use crate::config::RpcConfig;
use crate::error::{FeedError, ProtocolError, RangeTooLargeError, Result, TransportError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{BlockHeight, BlockWindow, LogFilter, RawLog};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC error code several providers use for "limit exceeded"
const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// Message fragments providers use when refusing a block span or result size
const RANGE_REJECTION_HINTS: &[&str] = &[
    "block range",
    "range is too large",
    "range too large",
    "too many blocks",
    "returned more than",
    "response size",
    "is limited to",
];

/// The two chain queries the transfer pipeline needs. No retries: each call
/// is one round-trip and every failure is reported as-is.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_latest_block_height(&self) -> Result<BlockHeight>;

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct RpcLogFilter {
    #[serde(rename = "fromBlock")]
    from_block: String,
    #[serde(rename = "toBlock")]
    to_block: String,
    address: String,
    topics: Vec<Option<String>>,
}

impl From<&LogFilter> for RpcLogFilter {
    fn from(filter: &LogFilter) -> Self {
        Self {
            from_block: format!("0x{:x}", filter.from_block()),
            to_block: format!("0x{:x}", filter.to_block()),
            address: format!("0x{}", hex::encode(filter.address.as_slice())),
            topics: vec![Some(format!("0x{}", hex::encode(filter.event_topic.as_slice())))],
        }
    }
}

#[derive(Debug, Deserialize)]
struct EthLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "transactionHash")]
    transaction_hash: String,
    #[serde(rename = "logIndex")]
    log_index: String,
}

impl EthLog {
    fn into_raw_log(self) -> std::result::Result<RawLog, ProtocolError> {
        let topics = self
            .topics
            .iter()
            .map(|topic| parse_word("topics", topic))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let log_index = parse_quantity("logIndex", &self.log_index)?;
        let log_index = u32::try_from(log_index).map_err(|_| ProtocolError::InvalidHex {
            field: "logIndex".to_string(),
            value: self.log_index.clone(),
        })?;

        Ok(RawLog {
            address: parse_address("address", &self.address)?,
            topics,
            data: parse_bytes("data", &self.data)?,
            block_number: parse_quantity("blockNumber", &self.block_number)?,
            transaction_hash: parse_word("transactionHash", &self.transaction_hash)?,
            log_index,
        })
    }
}

/// HTTP JSON-RPC implementation of [`ChainClient`]
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Result<Self> {
        Self::new_with_config(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn new_with_config(endpoint: String, timeout: Duration) -> Result<Self> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(timeout.as_secs()));
        context.info("Initializing RPC client");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Http)?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        Self::new_with_config(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            TransportError::Connection(e.to_string())
        } else {
            TransportError::Http(e)
        }
    }

    /// One JSON-RPC round-trip. `window` is set for range queries so that a
    /// provider's range limit is reported as [`RangeTooLargeError`].
    async fn make_request(&self, method: &str, params: Vec<Value>, window: Option<BlockWindow>) -> Result<Value> {
        let context = LogContext::new("rpc_client", "make_request")
            .with_metadata("method", json!(method))
            .with_metadata("endpoint", json!(self.endpoint));

        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        context.trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            if let Some(window) = window {
                return Err(range_too_large(window, None, "HTTP 413 Payload Too Large".to_string()));
            }
        }
        if !status.is_success() {
            return Err(TransportError::Status { status: status.as_u16() }.into());
        }

        let body = response.bytes().await.map_err(|e| self.classify_send_error(e))?;
        let rpc_response: JsonRpcResponse = serde_json::from_slice(&body).map_err(ProtocolError::Json)?;

        if let Some(error) = rpc_response.error {
            if let Some(window) = window {
                if is_range_rejection(error.code, &error.message) {
                    return Err(range_too_large(window, Some(error.code), error.message));
                }
            }
            return Err(ProtocolError::Method {
                code: error.code,
                message: error.message,
            }
            .into());
        }

        rpc_response.result.ok_or_else(|| {
            ProtocolError::MissingResult {
                method: method.to_string(),
            }
            .into()
        })
    }

    async fn fetch_latest_block_height(&self) -> Result<BlockHeight> {
        let value = self.make_request("eth_blockNumber", vec![], None).await?;

        let hex_string = value
            .as_str()
            .ok_or_else(|| ProtocolError::InvalidResponse("Block number is not a string".to_string()))?;
        let block_number = parse_quantity("result", hex_string)?;

        LogContext::new("rpc_client", "get_latest_block_height")
            .with_block_number(block_number)
            .debug(&format!("Retrieved latest block number: {}", block_number));

        Ok(block_number)
    }

    async fn fetch_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
        let params = vec![serde_json::to_value(RpcLogFilter::from(filter)).map_err(ProtocolError::Json)?];
        let value = self.make_request("eth_getLogs", params, Some(filter.window)).await?;

        let eth_logs: Vec<EthLog> = serde_json::from_value(value).map_err(ProtocolError::Json)?;

        let mut raw_logs = Vec::with_capacity(eth_logs.len());
        for eth_log in eth_logs {
            let raw_log = eth_log.into_raw_log()?;

            if !filter.window.contains(raw_log.block_number) {
                return Err(ProtocolError::LogOutOfRange {
                    block_number: raw_log.block_number,
                    from_block: filter.from_block(),
                    to_block: filter.to_block(),
                }
                .into());
            }
            if raw_log.address != filter.address {
                return Err(ProtocolError::UnexpectedAddress {
                    expected: format!("0x{}", hex::encode(filter.address.as_slice())),
                    got: format!("0x{}", hex::encode(raw_log.address.as_slice())),
                }
                .into());
            }

            raw_logs.push(raw_log);
        }

        LogContext::new("rpc_client", "get_logs")
            .with_window(&filter.window)
            .with_metadata("log_count", json!(raw_logs.len()))
            .debug(&format!("Retrieved {} logs", raw_logs.len()));

        Ok(raw_logs)
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn get_latest_block_height(&self) -> Result<BlockHeight> {
        let monitor = PerformanceMonitor::new("rpc_eth_blockNumber");
        let result = self.fetch_latest_block_height().await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call("eth_blockNumber", duration, result.is_ok());
        result
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
        let monitor = PerformanceMonitor::new("rpc_eth_getLogs")
            .with_metadata("from_block", json!(filter.from_block()))
            .with_metadata("to_block", json!(filter.to_block()));
        let result = self.fetch_logs(filter).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_rpc_call("eth_getLogs", duration, result.is_ok());
        result
    }
}

fn range_too_large(window: BlockWindow, code: Option<i64>, message: String) -> FeedError {
    RangeTooLargeError {
        from_block: window.from_block(),
        to_block: window.to_block(),
        code,
        message,
    }
    .into()
}

fn is_range_rejection(code: i64, message: &str) -> bool {
    let message = message.to_lowercase();
    code == LIMIT_EXCEEDED_CODE || RANGE_REJECTION_HINTS.iter().any(|hint| message.contains(hint))
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn invalid_hex(field: &str, value: &str) -> ProtocolError {
    ProtocolError::InvalidHex {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_quantity(field: &str, value: &str) -> std::result::Result<u64, ProtocolError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(invalid_hex(field, value));
    }
    u64::from_str_radix(digits, 16).map_err(|_| invalid_hex(field, value))
}

fn parse_bytes(field: &str, value: &str) -> std::result::Result<Vec<u8>, ProtocolError> {
    hex::decode(strip_hex_prefix(value)).map_err(|_| invalid_hex(field, value))
}

fn parse_word(field: &str, value: &str) -> std::result::Result<B256, ProtocolError> {
    B256::from_str(value).map_err(|_| invalid_hex(field, value))
}

fn parse_address(field: &str, value: &str) -> std::result::Result<Address, ProtocolError> {
    Address::from_str(value).map_err(|_| invalid_hex(field, value))
}
