//! Check command - validates configuration and pings both backends

use tracing::{error, info};

use crate::config::AppConfig;
use crate::infrastructure::observability::init_tracing;

/// Load and validate configuration, then ping the cache store and storage.
/// Returns an error if configuration is invalid or storage is unreachable;
/// an unreachable cache is reported but tolerated.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging, &config.observability.tracing);

    check(&config).await?;
    info!("Configuration and backends OK");
    Ok(())
}

pub(crate) async fn check(config: &AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    info!(
        storage = %config.storage.backend,
        cache = ?config.cache.backend,
        "Configuration valid"
    );

    let state = crate::create_app_state_with_config(config).await?;

    match state.cache.ping().await {
        Ok(()) => info!(backend = state.cache.backend_name(), "Cache store reachable"),
        Err(e) => error!(
            backend = state.cache.backend_name(),
            error = %e,
            "Cache store unreachable, requests will bypass the cache"
        ),
    }

    state.users.storage().ping().await?;
    info!(
        backend = state.users.storage().backend_name(),
        "Storage reachable"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_passes() {
        assert!(check(&AppConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_fails() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(check(&config).await.is_err());
    }
}
