use std::fmt::Write;

use crate::error::FeedError;
use crate::models::TransferBatch;
use crate::presentation::TransferSink;

/// HTML fragment with a heading and one table row per transfer
#[derive(Debug, Clone)]
pub struct HtmlTableSink {
    symbol: String,
}

impl HtmlTableSink {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
        }
    }

    fn heading(&self) -> String {
        format!("<h1>Recent {} Transfers</h1>\n", escape(&self.symbol))
    }
}

impl TransferSink for HtmlTableSink {
    type Output = String;

    fn render(&self, batch: &TransferBatch) -> String {
        let mut html = self.heading();
        html.push_str("<table>\n");
        let _ = write!(
            html,
            "  <tr>\n    <th>From</th>\n    <th>To</th>\n    <th>Amount ({})</th>\n    <th>Transaction ID</th>\n  </tr>\n",
            escape(&self.symbol)
        );

        if batch.is_empty() {
            let _ = write!(
                html,
                "  <tr class=\"empty\">\n    <td colspan=\"4\">No transfers in blocks {} to {}</td>\n  </tr>\n",
                batch.window.from_block(),
                batch.window.to_block()
            );
        }

        for transfer in &batch.transfers {
            let _ = write!(
                html,
                "  <tr>\n    <td>{}</td>\n    <td>{}</td>\n    <td>{}</td>\n    <td>{}</td>\n  </tr>\n",
                escape(&transfer.from),
                escape(&transfer.to),
                escape(&transfer.amount),
                escape(&transfer.tx_hash)
            );
        }

        html.push_str("</table>\n");
        html
    }

    fn render_failure(&self, error: &FeedError) -> String {
        let mut html = self.heading();
        let _ = write!(
            html,
            "<div class=\"error\" data-kind=\"{}\">\n  <p>Error fetching {} transfers: {}</p>\n</div>\n",
            error.kind(),
            escape(&self.symbol),
            escape(&error.to_string())
        );
        html
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::models::{BlockWindow, DecodedTransfer};

    fn sample_batch() -> TransferBatch {
        TransferBatch {
            window: BlockWindow::new(900, 1000).unwrap(),
            transfers: vec![DecodedTransfer {
                from: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
                to: "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
                amount: "2.5".to_string(),
                tx_hash: format!("0x{}", "11".repeat(32)),
                block_number: 950,
                log_index: 0,
            }],
        }
    }

    #[test]
    fn test_render_table() {
        let html = HtmlTableSink::new("USDC").render(&sample_batch());

        assert!(html.starts_with("<h1>Recent USDC Transfers</h1>"));
        assert!(html.contains("<th>From</th>"));
        assert!(html.contains("<th>To</th>"));
        assert!(html.contains("<th>Amount (USDC)</th>"));
        assert!(html.contains("<th>Transaction ID</th>"));
        assert!(html.contains("<td>0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa</td>"));
        assert!(html.contains("<td>2.5</td>"));
        assert_eq!(html.matches("<tr>").count(), 2);
        assert!(!html.contains("class=\"empty\""));
    }

    #[test]
    fn test_empty_batch_differs_from_failure() {
        let sink = HtmlTableSink::new("USDC");
        let empty = sink.render(&TransferBatch {
            window: BlockWindow::new(900, 1000).unwrap(),
            transfers: Vec::new(),
        });
        let failed = sink.render_failure(&FeedError::Transport(TransportError::Timeout { seconds: 30 }));

        assert!(empty.contains("No transfers in blocks 900 to 1000"));
        assert!(empty.contains("<table>"));
        assert!(!failed.contains("<table>"));
        assert!(failed.contains("data-kind=\"transport_error\""));
        assert!(failed.contains("Timeout after 30 seconds"));
    }

    #[test]
    fn test_symbol_is_escaped() {
        let html = HtmlTableSink::new("<b>&</b>").render(&sample_batch());
        assert!(html.contains("Recent &lt;b&gt;&amp;&lt;/b&gt; Transfers"));
        assert!(!html.contains("<b>"));
    }
}
