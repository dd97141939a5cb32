pub mod event_decoder;
pub mod rpc_client;
pub mod transfer_decoder;
pub mod transfer_pipeline;

pub use event_decoder::{decode, DecodedFields, DecodedValue, EventParam, EventSignature, ParamKind};
pub use rpc_client::{ChainClient, RpcClient};
pub use transfer_decoder::{normalize_address, validate_address, AddressFormat, TransferDecoder};
pub use transfer_pipeline::{PipelineSettings, PipelineState, TransferPipeline};
