use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use peerpost_chat::MattermostClient;
use peerpost_db::DbPool;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    client: Arc<MattermostClient>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub mattermost: HealthCheck,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, client: Arc<MattermostClient>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { db_pool, client })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let mattermost = mattermost_check(&state.client).await;
    let ready = database.status == "ready" && mattermost.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "peerpost-server runtime initialized".to_string(),
        },
        database,
        mattermost,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn mattermost_check(client: &MattermostClient) -> HealthCheck {
    match client.ping().await {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: format!("{} answered system ping", client.site_url()),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("mattermost ping failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{extract::State, http::StatusCode, Json};
    use peerpost_chat::MattermostClient;
    use peerpost_db::connect_with_settings;

    use crate::health::{health, HealthState};

    fn unreachable_client() -> Arc<MattermostClient> {
        Arc::new(
            MattermostClient::new(
                "http://127.0.0.1:9",
                &"bot-token-for-tests".to_string().into(),
                Duration::from_secs(2),
            )
            .expect("client"),
        )
    }

    #[tokio::test]
    async fn health_is_degraded_when_mattermost_is_unreachable() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), client: unreachable_client() }))
                .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.mattermost.status, "degraded");
        assert_eq!(payload.service.status, "ready");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_reports_closed_database() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool, client: unreachable_client() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.database.status, "degraded");
        assert!(payload.database.detail.starts_with("database query failed"));
    }
}
