use erc20_transfer_feed::api::ApiServer;
use erc20_transfer_feed::{init_logging, AppConfig, ErrorLogger, LogContext};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    let server = ApiServer::from_config(&config)?;

    log::info!(
        "Serving recent {} transfers on {}:{}",
        config.token.symbol,
        server.host,
        server.port
    );

    if let Err(e) = server.start().await {
        ErrorLogger::log_error(&e, Some(LogContext::new("server", "start")));
        return Err(e.into());
    }

    Ok(())
}
