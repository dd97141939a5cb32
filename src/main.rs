use erc20_transfer_feed::{
    init_logging, AppConfig, ErrorLogger, HtmlTableSink, LogContext, PipelineSettings, RpcClient, TransferPipeline,
    TransferSink,
};
use log::info;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let sink = HtmlTableSink::new(&config.token.symbol);

    let pipeline = RpcClient::from_config(&config.rpc).and_then(|client| {
        let settings = PipelineSettings::from_config(&config)?;
        Ok(TransferPipeline::new(client, settings))
    });
    let mut pipeline = match pipeline {
        Ok(pipeline) => pipeline,
        Err(e) => {
            ErrorLogger::log_error(&e, Some(LogContext::new("main", "setup")));
            eprint!("{}", sink.render_failure(&e));
            std::process::exit(1);
        }
    };

    info!("Fetching recent {} transfers", config.token.symbol);

    // Failures are logged by the pipeline itself
    match pipeline.run().await {
        Ok(batch) => print!("{}", sink.render(&batch)),
        Err(e) => {
            eprint!("{}", sink.render_failure(&e));
            std::process::exit(1);
        }
    }
}
