use std::sync::Arc;
use wastesort::{
    logger::{self, LoggerConfig},
    server::{self, AppState},
    Config, Orchestrator,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let config = Config::from_env();

    let mut logger_config = LoggerConfig::new();
    if let Some(level) = config.log_level.as_deref().and_then(logger::parse_level) {
        logger_config = logger_config.with_level(level);
    }
    if let Some(path) = &config.log_file {
        logger_config = logger_config.with_file_output(path);
    }
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    let orchestrator = Arc::new(Orchestrator::from_config(&config).await);
    log::info!(
        "Strategies: generative {}, local detector {}",
        if orchestrator.primary_available() { "✅" } else { "❌" },
        if orchestrator.fallback_available() { "✅" } else { "❌" }
    );

    server::run(&config, AppState::new(orchestrator)).await?;
    Ok(())
}
