use review_desk::{agents::ChatCompletionClient, config, router, state};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_desk=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env().map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;

    let model = ChatCompletionClient::from_config(&config)?;
    tracing::info!("Using model {} at {}", config.llm_model, config.llm_base_url);

    let state = Arc::new(state::AppState::new(config.clone(), Arc::new(model)));
    state.store.init()?;

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Review desk listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
