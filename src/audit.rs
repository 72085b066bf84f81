use chrono::Utc;
use serde_json::{Value, json};

use crate::{error::AppResult, services::api_service::ApiService};

pub async fn log_audit(
    api: &ApiService,
    actor: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let record = json!({
        "actor": actor,
        "action": action,
        "resource": resource,
        "metadata": metadata,
        "created_at": Utc::now().to_rfc3339(),
    });
    api.execute("INSERT INTO audit_logs", vec![record]).await?;
    Ok(())
}

/// Records an audit entry, logging instead of failing when it cannot be written.
pub async fn record(
    api: &ApiService,
    actor: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    if let Err(err) = log_audit(api, actor, action, resource, metadata).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
