use clap::Parser;
use slot_matcher::config::ServiceConfig;
use slot_matcher::error::ServiceError;
use slot_matcher::server;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    let config = ServiceConfig::parse();
    env_logger::Builder::new()
        .parse_filters(&config.log_filter)
        .init();

    server::run_server(&config).await
}
