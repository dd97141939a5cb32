//! Sinks that turn the outcome of a pipeline run into something displayable.

pub mod html;
pub mod json;

use crate::error::FeedError;
use crate::models::TransferBatch;

pub use html::HtmlTableSink;
pub use json::JsonSink;

/// Renders a successful batch or a failed run. A failure must never render
/// the same as an empty batch.
pub trait TransferSink {
    type Output;

    fn render(&self, batch: &TransferBatch) -> Self::Output;

    fn render_failure(&self, error: &FeedError) -> Self::Output;
}
