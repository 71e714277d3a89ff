use axum::Json;
use serde_json::{Value, json};

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::health;

    #[tokio::test]
    async fn health_reports_ok() {
        let body = health().await.0;
        assert_eq!(body, serde_json::json!({ "ok": true }));
    }
}
