use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::blockchain::{PipelineSettings, RpcClient, TransferPipeline};
use crate::config::AppConfig;
use crate::error::{FeedError, Result};
use crate::models::TransferBatch;
use crate::presentation::{HtmlTableSink, JsonSink, TransferSink};

/// Response structure for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub contract_address: String,
    pub symbol: String,
    pub window_size: u64,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub client: RpcClient,
    pub settings: PipelineSettings,
    pub symbol: String,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            client: RpcClient::from_config(&config.rpc)?,
            settings: PipelineSettings::from_config(config)?,
            symbol: config.token.symbol.clone(),
        })
    }

    /// Every request gets a fresh pipeline; runs share nothing
    async fn run_pipeline(&self) -> Result<TransferBatch> {
        TransferPipeline::new(self.client.clone(), self.settings.clone()).run().await
    }
}

/// HTTP status for a failed run
pub fn status_for(error: &FeedError) -> StatusCode {
    match error {
        FeedError::RangeTooLarge(_) => StatusCode::UNPROCESSABLE_ENTITY,
        FeedError::Transport(_) | FeedError::Protocol(_) | FeedError::DecodeMismatch { .. } => StatusCode::BAD_GATEWAY,
        FeedError::Config(_) | FeedError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_transfers_page))
        .route("/transfers", get(get_transfers))
        .route("/health", get(get_health))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

/// HTTP front end over the transfer pipeline
pub struct ApiServer {
    state: AppState,
    pub host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(AppState::from_config(config)?, &config.api.host, config.api.port))
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<()> {
        let app = create_router(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| FeedError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("HTTP API server starting on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| FeedError::Server(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// GET / - HTML table of the transfers in the most recent window
pub async fn get_transfers_page(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let sink = HtmlTableSink::new(&state.symbol);

    match state.run_pipeline().await {
        Ok(batch) => (StatusCode::OK, Html(sink.render(&batch))),
        // Already logged by the pipeline
        Err(e) => (status_for(&e), Html(sink.render_failure(&e))),
    }
}

/// GET /transfers - the same data as JSON
pub async fn get_transfers(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.run_pipeline().await {
        Ok(batch) => (StatusCode::OK, Json(JsonSink.render(&batch))),
        Err(e) => (status_for(&e), Json(JsonSink.render_failure(&e))),
    }
}

/// GET /health - static liveness info, never touches the chain
pub async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        contract_address: format!("0x{}", hex::encode(state.settings.contract_address.as_slice())),
        symbol: state.symbol,
        window_size: state.settings.window_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RangeTooLargeError, TransportError};

    #[test]
    fn test_status_mapping() {
        let range = FeedError::RangeTooLarge(RangeTooLargeError {
            from_block: 0,
            to_block: 10,
            code: None,
            message: "too many".to_string(),
        });
        assert_eq!(status_for(&range), StatusCode::UNPROCESSABLE_ENTITY);

        let timeout = FeedError::Transport(TransportError::Timeout { seconds: 1 });
        assert_eq!(status_for(&timeout), StatusCode::BAD_GATEWAY);

        let config = FeedError::Config(ConfigError::MissingEnvVar("MAINNET_RPC_URL".to_string()));
        assert_eq!(status_for(&config), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
