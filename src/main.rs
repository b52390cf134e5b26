//! Person cache service.
//!
//! Consumes person events from the configured topic and keeps the Redis
//! person cache in step with them. Runs until Ctrl-C.

use std::sync::Arc;

use event_bridge::adapters::cache::RedisCache;
use event_bridge::adapters::events::kafka::{KafkaLogConsumer, KafkaProducerFactory};
use event_bridge::application::{CreatePersonHandler, DeletePersonHandler, UpdatePersonHandler};
use event_bridge::config::AppConfig;
use event_bridge::ports::CacheStore;
use event_bridge::Bridge;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let cache: Arc<dyn CacheStore> = Arc::new(RedisCache::connect(&config.cache).await?);
    let consumer = KafkaLogConsumer::new(&config.broker)?;

    let bridge = Bridge::builder(config.broker.clone(), config.dispatch.clone())
        .consumer(Box::new(consumer))
        .producer_factory(Arc::new(KafkaProducerFactory))
        .handler(Arc::new(CreatePersonHandler::new(Arc::clone(&cache))))
        .handler(Arc::new(UpdatePersonHandler::new(Arc::clone(&cache))))
        .handler(Arc::new(DeletePersonHandler::new(Arc::clone(&cache))))
        .build();

    bridge.start()?;
    tracing::info!("Person cache service running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    bridge.close().await;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Person cache service failed");
        std::process::exit(1);
    }
}
