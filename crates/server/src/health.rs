use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use hrdesk_db::DbPool;
use serde::Serialize;
use serde_json::json;

use crate::api::{ApiReply, ApiResponse};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

/// `/health`, relative to the `/api` prefix.
pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool })
}

pub async fn health(State(state): State<HealthState>) -> ApiReply {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let data = json!({
        "status": if ready { "ready" } else { "degraded" },
        "database": database,
        "checked_at": Utc::now().to_rfc3339(),
    });

    if ready {
        (StatusCode::OK, Json(ApiResponse::ok("服务正常运行", data)))
    } else {
        let response = ApiResponse { data: Some(data), ..ApiResponse::failed("数据库不可用") };
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
