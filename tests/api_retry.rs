use std::{sync::Arc, time::Duration};

use mero_gamala_api::{
    config::{AppConfig, DbSettings},
    db::{DbError, MockDatabase},
    error::AppError,
    services::api_service::ApiService,
};

fn api(db: Arc<MockDatabase>, max_retries: usize, timeout: Duration) -> ApiService {
    let settings = DbSettings {
        request_timeout: timeout,
        max_retries,
        retry_delay: Duration::from_millis(2),
    };
    ApiService::new(db, &settings, AppConfig::local().is_development())
}

#[tokio::test]
async fn transient_failures_below_budget_are_retried() -> anyhow::Result<()> {
    let db = Arc::new(MockDatabase::new());
    let api = api(Arc::clone(&db), 3, Duration::from_secs(2));

    db.fail_next([
        DbError::Connection("reset".into()),
        DbError::Network("unreachable".into()),
    ]);
    let plants = api.get_plants().await?;

    assert!(!plants.is_empty());
    assert_eq!(db.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn validation_failures_are_attempted_once() {
    let db = Arc::new(MockDatabase::new());
    let api = api(Arc::clone(&db), 3, Duration::from_secs(2));

    db.fail_next([DbError::Validation("bad row".into())]);
    let err = api.get_categories().await.unwrap_err();

    assert!(matches!(err, AppError::Database(DbError::Validation(_))));
    assert_eq!(db.call_count(), 1);
}

#[tokio::test]
async fn exhausted_budget_surfaces_the_last_error() {
    let db = Arc::new(MockDatabase::new());
    let api = api(Arc::clone(&db), 1, Duration::from_secs(2));

    db.fail_next([
        DbError::Connection("first".into()),
        DbError::Connection("second".into()),
    ]);
    let err = api.get_plants().await.unwrap_err();

    assert!(matches!(err, AppError::Database(DbError::Connection(ref msg)) if msg == "second"));
    assert_eq!(db.call_count(), 2);
}

#[tokio::test]
async fn slow_database_hits_the_overall_timeout() {
    let db = Arc::new(MockDatabase::new());
    db.set_latency(Duration::from_millis(200));
    let api = api(Arc::clone(&db), 3, Duration::from_millis(50));

    let err = api.get_plants().await.unwrap_err();
    assert!(matches!(err, AppError::Database(DbError::Timeout(50))));
}

#[test]
fn untyped_errors_are_classified_by_message() {
    assert!(DbError::Other("socket timeout".into()).is_retryable());
    assert!(!DbError::Other("Invalid order data".into()).is_retryable());
    assert!(!DbError::Other("something odd".into()).is_retryable());
}
