use axum::extract::State;
use mero_gamala_api::{config::AppConfig, routes::health::health_check, state::AppState};

#[tokio::test]
async fn health_check_returns_ok() -> anyhow::Result<()> {
    let state = AppState::build(AppConfig::local()).await?;
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");
    assert!(response.0.data.is_some());
    Ok(())
}
