use alloy_primitives::Address;
use serde_json::json;

use crate::blockchain::rpc_client::ChainClient;
use crate::blockchain::transfer_decoder::{AddressFormat, TransferDecoder};
use crate::config::AppConfig;
use crate::error::{ConfigError, FeedError, Result};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{BlockHeight, BlockWindow, DecodedTransfer, LogFilter, RawLog, TransferBatch};

/// Where a pipeline run currently is, or how the last one ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    FetchingHeight,
    FetchingLogs { window: BlockWindow },
    Decoding { log_count: usize },
    Done { transfer_count: usize },
    Failed { kind: &'static str },
}

/// Fixed inputs of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub contract_address: Address,
    pub window_size: u64,
    pub decimals: u8,
    pub address_format: AddressFormat,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            contract_address: config.token.address()?,
            window_size: config.fetch.window_size,
            decimals: config.token.decimals,
            address_format: config.fetch.address_format,
        })
    }
}

/// Fetches the `Transfer` logs of one token over the most recent block
/// window and decodes them. Strictly sequential, one attempt per stage.
pub struct TransferPipeline<C: ChainClient> {
    client: C,
    contract_address: Address,
    window_size: u64,
    decoder: TransferDecoder,
    state: PipelineState,
}

impl<C: ChainClient> TransferPipeline<C> {
    pub fn new(client: C, settings: PipelineSettings) -> Self {
        Self {
            client,
            contract_address: settings.contract_address,
            window_size: settings.window_size,
            decoder: TransferDecoder::new(settings.decimals, settings.address_format),
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The log query for a chain whose head is at `latest`
    pub fn filter_for(&self, latest: BlockHeight) -> LogFilter {
        LogFilter::new(
            self.contract_address,
            self.decoder.signature().topic0(),
            BlockWindow::ending_at(latest, self.window_size),
        )
    }

    /// Run once. Either every log in the window decodes and the batch is
    /// returned in chain order, or the run fails with the first error and
    /// nothing is returned.
    pub async fn run(&mut self) -> Result<TransferBatch> {
        self.state = PipelineState::Idle;
        let monitor = PerformanceMonitor::new("transfer_pipeline_run");

        let result = self.execute(&monitor).await;

        match &result {
            Ok(batch) => {
                self.state = PipelineState::Done {
                    transfer_count: batch.transfers.len(),
                };
            }
            Err(e) => {
                self.state = PipelineState::Failed { kind: e.kind() };
                ErrorLogger::log_error(e, Some(LogContext::new("transfer_pipeline", "run")));
            }
        }

        monitor.finish_with_result(&result);
        result
    }

    async fn execute(&mut self, monitor: &PerformanceMonitor) -> Result<TransferBatch> {
        self.state = PipelineState::FetchingHeight;
        let latest = self.client.get_latest_block_height().await?;

        let filter = self.filter_for(latest);
        let window = filter.window;
        LogContext::new("transfer_pipeline", "window")
            .with_window(&window)
            .info(&format!("Fetching transfers from block {} to {}", window.from_block(), window.to_block()));

        self.state = PipelineState::FetchingLogs { window };
        let raw_logs = self.client.get_logs(&filter).await?;

        self.state = PipelineState::Decoding {
            log_count: raw_logs.len(),
        };
        let transfers = self.decode_all(&raw_logs)?;

        let elapsed_ms = monitor.start_time.elapsed().unwrap_or_default().as_millis() as u64;
        MetricsLogger::log_fetch_completed(&window, raw_logs.len(), transfers.len(), elapsed_ms);

        Ok(TransferBatch { window, transfers })
    }

    fn decode_all(&self, raw_logs: &[RawLog]) -> Result<Vec<DecodedTransfer>> {
        raw_logs
            .iter()
            .map(|log| -> Result<DecodedTransfer> {
                let transfer = self.decoder.decode_transfer(log).map_err(|source| FeedError::DecodeMismatch {
                    block_number: log.block_number,
                    log_index: log.log_index,
                    transaction_hash: format!("0x{}", hex::encode(log.transaction_hash.as_slice())),
                    source,
                })?;

                LogContext::new("transfer_pipeline", "decode")
                    .with_block_number(transfer.block_number)
                    .with_transaction_hash(&transfer.tx_hash)
                    .with_metadata("from", json!(transfer.from))
                    .with_metadata("to", json!(transfer.to))
                    .with_metadata("amount", json!(transfer.amount))
                    .debug("Decoded transfer log");

                Ok(transfer)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::event_decoder::EventSignature;
    use crate::error::{DecodeMismatchError, TransportError};
    use alloy_primitives::{B256, U256};
    use async_trait::async_trait;
    use std::sync::Mutex;

    // Mock chain client for testing
    struct MockChainClient {
        latest: BlockHeight,
        logs: Vec<RawLog>,
        logs_timeout: bool,
        seen_filter: Mutex<Option<LogFilter>>,
    }

    impl MockChainClient {
        fn new(latest: BlockHeight) -> Self {
            Self {
                latest,
                logs: Vec::new(),
                logs_timeout: false,
                seen_filter: Mutex::new(None),
            }
        }

        fn with_logs(mut self, logs: Vec<RawLog>) -> Self {
            self.logs = logs;
            self
        }

        fn with_logs_timeout(mut self) -> Self {
            self.logs_timeout = true;
            self
        }
    }

    #[async_trait]
    impl ChainClient for MockChainClient {
        async fn get_latest_block_height(&self) -> Result<BlockHeight> {
            Ok(self.latest)
        }

        async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>> {
            *self.seen_filter.lock().unwrap() = Some(filter.clone());
            if self.logs_timeout {
                return Err(TransportError::Timeout { seconds: 30 }.into());
            }
            Ok(self.logs.clone())
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            contract_address: Address::repeat_byte(0xdc),
            window_size: 100,
            decimals: 6,
            address_format: AddressFormat::Lowercase,
        }
    }

    fn create_mock_transfer_log(block_number: u64, log_index: u32, amount: u64) -> RawLog {
        RawLog {
            address: Address::repeat_byte(0xdc),
            topics: vec![
                EventSignature::erc20_transfer().topic0(),
                B256::left_padding_from(Address::repeat_byte(0xaa).as_slice()),
                B256::left_padding_from(Address::repeat_byte(0xbb).as_slice()),
            ],
            data: B256::from(U256::from(amount)).to_vec(),
            block_number,
            transaction_hash: B256::repeat_byte(log_index as u8),
            log_index,
        }
    }

    #[tokio::test]
    async fn test_pipeline_starts_idle() {
        let pipeline = TransferPipeline::new(MockChainClient::new(1000), settings());
        assert_eq!(pipeline.state(), &PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let client = MockChainClient::new(1000).with_logs(vec![create_mock_transfer_log(950, 0, 2_500_000)]);
        let mut pipeline = TransferPipeline::new(client, settings());

        let batch = pipeline.run().await.unwrap();

        assert_eq!(batch.window, BlockWindow::new(900, 1000).unwrap());
        assert_eq!(batch.transfers.len(), 1);
        let transfer = &batch.transfers[0];
        assert_eq!(transfer.from, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
        assert_eq!(transfer.to, "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        assert_eq!(transfer.amount, "2.5");
        assert_eq!(transfer.block_number, 950);
        assert_eq!(pipeline.state(), &PipelineState::Done { transfer_count: 1 });

        let filter = pipeline.client.seen_filter.lock().unwrap().clone().unwrap();
        assert_eq!(filter.from_block(), 900);
        assert_eq!(filter.to_block(), 1000);
        assert_eq!(filter.address, Address::repeat_byte(0xdc));
        assert_eq!(filter.event_topic, EventSignature::erc20_transfer().topic0());
    }

    #[tokio::test]
    async fn test_window_clamped_near_genesis() {
        let mut pipeline = TransferPipeline::new(MockChainClient::new(30), settings());
        let batch = pipeline.run().await.unwrap();
        assert_eq!(batch.window, BlockWindow::new(0, 30).unwrap());
    }

    #[tokio::test]
    async fn test_zero_logs_is_done_not_failed() {
        let mut pipeline = TransferPipeline::new(MockChainClient::new(1000), settings());

        let batch = pipeline.run().await.unwrap();

        assert!(batch.is_empty());
        assert_eq!(pipeline.state(), &PipelineState::Done { transfer_count: 0 });
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let logs = vec![
            create_mock_transfer_log(901, 5, 1),
            create_mock_transfer_log(901, 9, 2),
            create_mock_transfer_log(977, 0, 3),
        ];
        let mut pipeline = TransferPipeline::new(MockChainClient::new(1000).with_logs(logs), settings());

        let transfers = pipeline.run().await.unwrap().into_transfers();

        let positions: Vec<(u64, u32)> = transfers.iter().map(|t| (t.block_number, t.log_index)).collect();
        assert_eq!(positions, vec![(901, 5), (901, 9), (977, 0)]);
        assert_eq!(transfers[2].amount, "0.000003");
    }

    #[tokio::test]
    async fn test_logs_timeout_fails_with_transport_error() {
        let mut pipeline = TransferPipeline::new(MockChainClient::new(1000).with_logs_timeout(), settings());

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, FeedError::Transport(TransportError::Timeout { .. })));
        assert_eq!(pipeline.state(), &PipelineState::Failed { kind: "transport_error" });
    }

    #[tokio::test]
    async fn test_first_decode_failure_fails_whole_run() {
        let mut bad = create_mock_transfer_log(960, 4, 7);
        bad.topics.truncate(2);
        let logs = vec![create_mock_transfer_log(950, 0, 1), bad, create_mock_transfer_log(970, 1, 1)];
        let mut pipeline = TransferPipeline::new(MockChainClient::new(1000).with_logs(logs), settings());

        let err = pipeline.run().await.unwrap_err();

        match err {
            FeedError::DecodeMismatch {
                block_number,
                log_index,
                transaction_hash,
                source,
            } => {
                assert_eq!(block_number, 960);
                assert_eq!(log_index, 4);
                assert_eq!(transaction_hash, format!("0x{}", "04".repeat(32)));
                assert_eq!(source, DecodeMismatchError::TopicCount { expected: 3, got: 2 });
            }
            other => panic!("expected DecodeMismatch, got {:?}", other),
        }
        assert_eq!(pipeline.state(), &PipelineState::Failed { kind: "decode_mismatch" });
    }

    #[tokio::test]
    async fn test_runs_are_independent() {
        let client = MockChainClient::new(1000).with_logs(vec![create_mock_transfer_log(950, 0, 2_500_000)]);
        let mut pipeline = TransferPipeline::new(client, settings());

        let first = pipeline.run().await.unwrap();
        let second = pipeline.run().await.unwrap();
        assert_eq!(first, second);
    }
}
