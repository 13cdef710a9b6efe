use std::sync::Arc;

use kyc_backend::{
    server,
    sumsub::{FileDumpObserver, SumsubClient},
    types::{Environment, SumsubConfig},
    webhook::ReviewStore,
};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    // Configure logging format based on environment
    // Use JSON format for staging/production (Datadog), regular format for development
    if environment.json_logs() {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(SumsubConfig::from_env()?);
    tracing::debug!("Loaded configuration: {config:?}");

    let mut sumsub = SumsubClient::new(
        config.base_url.clone(),
        config.credentials(),
        config.request_timeout,
    );
    if let Some(dir) = &config.response_dump_dir {
        tracing::info!("Dumping Sumsub responses into {dir}");
        sumsub = sumsub.with_observer(Arc::new(FileDumpObserver::new(dir)));
    }

    server::start(
        environment,
        config,
        Arc::new(sumsub),
        Arc::new(ReviewStore::new()),
    )
    .await
}
