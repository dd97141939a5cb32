pub mod transfer;
pub mod units;

pub use transfer::{BlockHeight, BlockWindow, DecodedTransfer, LogFilter, RawLog, TransferBatch};
pub use units::{format_units, parse_units};
