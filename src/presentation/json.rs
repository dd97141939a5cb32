use serde_json::{json, Value};

use crate::error::FeedError;
use crate::models::TransferBatch;
use crate::presentation::TransferSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink;

impl TransferSink for JsonSink {
    type Output = Value;

    fn render(&self, batch: &TransferBatch) -> Value {
        json!({
            "from_block": batch.window.from_block(),
            "to_block": batch.window.to_block(),
            "transfers": batch.transfers,
        })
    }

    fn render_failure(&self, error: &FeedError) -> Value {
        json!({
            "error": error.kind(),
            "message": error.to_string(),
        })
    }
}
