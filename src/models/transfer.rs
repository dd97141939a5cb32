use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

pub type BlockHeight = u64;

/// Inclusive block range queried in one fetch. `from_block <= to_block` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockWindow {
    from_block: BlockHeight,
    to_block: BlockHeight,
}

impl BlockWindow {
    pub fn new(from_block: BlockHeight, to_block: BlockHeight) -> Option<Self> {
        (from_block <= to_block).then_some(Self { from_block, to_block })
    }

    /// The window `[latest - size, latest]`, clamped at genesis.
    pub fn ending_at(latest: BlockHeight, size: u64) -> Self {
        Self {
            from_block: latest.saturating_sub(size),
            to_block: latest,
        }
    }

    pub fn from_block(&self) -> BlockHeight {
        self.from_block
    }

    pub fn to_block(&self) -> BlockHeight {
        self.to_block
    }

    pub fn contains(&self, block_number: BlockHeight) -> bool {
        self.from_block <= block_number && block_number <= self.to_block
    }
}

/// Query for logs of one contract and one event over a block window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub event_topic: B256,
    pub window: BlockWindow,
}

impl LogFilter {
    pub fn new(address: Address, event_topic: B256, window: BlockWindow) -> Self {
        Self {
            address,
            event_topic,
            window,
        }
    }

    pub fn from_block(&self) -> BlockHeight {
        self.window.from_block()
    }

    pub fn to_block(&self) -> BlockHeight {
        self.window.to_block()
    }
}

/// A log entry exactly as the endpoint returned it, with hex already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
    pub block_number: BlockHeight,
    pub transaction_hash: B256,
    pub log_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecodedTransfer {
    pub from: String,
    pub to: String,
    pub amount: String, // Decimal string, already rescaled by token decimals
    pub tx_hash: String,
    pub block_number: BlockHeight,
    pub log_index: u32,
}

/// Output of one pipeline run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransferBatch {
    pub window: BlockWindow,
    pub transfers: Vec<DecodedTransfer>,
}

impl TransferBatch {
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn into_transfers(self) -> Vec<DecodedTransfer> {
        self.transfers
    }
}
