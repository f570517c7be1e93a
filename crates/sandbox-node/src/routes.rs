use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use sandbox_core::{
    audit, tamper, view, AuditReport, BlockRow, ChainConfig, Difficulty, JobId, MiningStatus,
    TamperOutcome,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    constants::DOT_CONTENT_TYPE,
    error::{ApiError, ApiResult},
    sessions::SessionRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub default_difficulty: Difficulty,
}

impl AppState {
    pub fn new(config: ChainConfig, default_difficulty: Difficulty, max_sessions: usize) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config, max_sessions)),
            default_difficulty,
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    sessions: usize,
}

#[derive(Serialize)]
struct Created {
    session: String,
    genesis: BlockRow,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: String,
    pub difficulty: Option<i64>,
}

#[derive(Deserialize, Default)]
pub struct MineParams {
    #[serde(default)]
    pub wait: bool,
}

#[derive(Serialize)]
struct MineAccepted {
    job: JobId,
    status: MiningStatus,
}

#[derive(Serialize)]
struct Mined {
    job: JobId,
    block: BlockRow,
}

#[derive(Serialize)]
struct Cancelled {
    cancelled: Option<JobId>,
}

#[derive(Deserialize)]
pub struct TamperRequest {
    pub index: u64,
    pub data: String,
}

#[derive(Serialize)]
struct TamperResponse {
    outcome: TamperOutcome,
    audit: AuditReport,
    chain: Vec<BlockRow>,
}

#[derive(Deserialize, Default)]
pub struct GraphParams {
    pub format: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(close_session))
        .route("/sessions/{id}/chain", get(list_chain))
        .route("/sessions/{id}/chain/tip", get(chain_tip))
        .route("/sessions/{id}/chain/audit", get(audit_chain))
        .route("/sessions/{id}/chain/{index}", get(chain_block))
        .route("/sessions/{id}/graph", get(link_graph))
        .route(
            "/sessions/{id}/mine",
            post(start_mining).get(mining_status).delete(cancel_mining),
        )
        .route("/sessions/{id}/reset", post(reset_chain))
        .route("/sessions/{id}/tamper", post(tamper_copy))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        sessions: state.registry.len().await,
    })
}

async fn create_session(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (id, session) = state.registry.create().await?;
    let genesis = BlockRow::from(&session.tip());
    Ok((
        StatusCode::CREATED,
        Json(Created {
            session: id,
            genesis,
        }),
    ))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.registry.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<BlockRow>>> {
    let session = state.registry.get(&id).await?;
    Ok(Json(view::rows(&session.snapshot())))
}

async fn chain_tip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BlockRow>> {
    let session = state.registry.get(&id).await?;
    Ok(Json(BlockRow::from(&session.tip())))
}

async fn chain_block(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, u64)>,
) -> ApiResult<Json<BlockRow>> {
    let session = state.registry.get(&id).await?;
    let block = session.get(index).ok_or(ApiError::BlockNotFound(index))?;
    Ok(Json(BlockRow::from(&block)))
}

async fn audit_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AuditReport>> {
    let session = state.registry.get(&id).await?;
    Ok(Json(session.audit()))
}

async fn link_graph(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<GraphParams>,
) -> ApiResult<Response> {
    let graph = state.registry.get(&id).await?.graph();
    Ok(match params.format.as_deref() {
        Some("json") => Json(graph).into_response(),
        Some("text") => graph.to_text().into_response(),
        _ => ([(header::CONTENT_TYPE, DOT_CONTENT_TYPE)], graph.to_dot()).into_response(),
    })
}

async fn start_mining(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MineParams>,
    Json(req): Json<MineRequest>,
) -> ApiResult<Response> {
    let difficulty = match req.difficulty {
        Some(zeros) => Difficulty::new(zeros)?,
        None => state.default_difficulty,
    };
    let session = state.registry.get(&id).await?;
    let job = session.start_mining(req.data, difficulty);
    info!(session = %id, job, %difficulty, "mining requested");

    if params.wait {
        let block = session.wait_for(job).await?;
        return Ok(Json(Mined {
            job,
            block: BlockRow::from(&block),
        })
        .into_response());
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(MineAccepted {
            job,
            status: session.mining_status(),
        }),
    )
        .into_response())
}

async fn mining_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MiningStatus>> {
    let session = state.registry.get(&id).await?;
    Ok(Json(session.mining_status()))
}

async fn cancel_mining(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Cancelled>> {
    let session = state.registry.get(&id).await?;
    Ok(Json(Cancelled {
        cancelled: session.cancel_mining(),
    }))
}

async fn reset_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<BlockRow>>> {
    let session = state.registry.get(&id).await?;
    session.reset();
    info!(session = %id, "chain reset");
    Ok(Json(view::rows(&session.snapshot())))
}

/// Runs the tamper experiment on a copy; the session's chain is untouched.
async fn tamper_copy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TamperRequest>,
) -> ApiResult<Json<TamperResponse>> {
    let session = state.registry.get(&id).await?;
    let mode = session.config().timestamp_mode;
    let mut copy = session.snapshot();
    let outcome = tamper(&mut copy, req.index, req.data, mode)?;
    let audit = audit(&copy, mode);
    Ok(Json(TamperResponse {
        outcome,
        audit,
        chain: view::rows(&copy),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sandbox_core::{Clock, TimestampMode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = ChainConfig::default()
            .with_timestamp_mode(TimestampMode::Excluded)
            .with_clock(Clock::Fixed(0));
        router(AppState::new(config, Difficulty::default(), 8))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["genesis"]["index"], 0);
        assert_eq!(body["genesis"]["previous_hash"], "0");
        body["session"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_mine_and_list() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/mine?wait=true"),
            Some(serde_json::json!({ "data": "Alice pays Bob 10", "difficulty": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["block"]["index"], 1);
        assert_eq!(body["block"]["nonce"], 187);

        let (_, chain) = send(&app, "GET", &format!("/sessions/{id}/chain"), None).await;
        let chain = chain.as_array().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1]["previous_hash"], chain[0]["hash"]);
        assert!(chain[1]["hash"].as_str().unwrap().starts_with("00"));

        let (_, tip) = send(&app, "GET", &format!("/sessions/{id}/chain/tip"), None).await;
        assert_eq!(tip, chain[1]);

        let (_, block) = send(&app, "GET", &format!("/sessions/{id}/chain/0"), None).await;
        assert_eq!(block, chain[0]);
        let (status, _) = send(&app, "GET", &format!("/sessions/{id}/chain/5"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_difficulty_is_validated() {
        let app = app();
        let id = new_session(&app).await;
        for bad in [0, 5, -1] {
            let (status, body) = send(
                &app,
                "POST",
                &format!("/sessions/{id}/mine"),
                Some(serde_json::json!({ "data": "x", "difficulty": bad })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].as_str().unwrap().contains("outside supported range"));
        }
    }

    #[tokio::test]
    async fn test_background_mining_then_status() {
        let app = app();
        let id = new_session(&app).await;
        let (status, body) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/mine"),
            Some(serde_json::json!({ "data": "async" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let job = body["job"].as_u64().unwrap();

        let mut finished = false;
        for _ in 0..200 {
            let (_, status) = send(&app, "GET", &format!("/sessions/{id}/mine"), None).await;
            if status["state"] == "finished" {
                assert_eq!(status["job"], job);
                finished = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(finished);
    }

    #[tokio::test]
    async fn test_reset_and_unknown_session() {
        let app = app();
        let id = new_session(&app).await;
        send(
            &app,
            "POST",
            &format!("/sessions/{id}/mine?wait=true"),
            Some(serde_json::json!({ "data": "x", "difficulty": 1 })),
        )
        .await;
        let (status, chain) = send(&app, "POST", &format!("/sessions/{id}/reset"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(chain.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/sessions/nope/chain", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/sessions/{id}/chain"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tamper_leaves_live_chain_alone() {
        let app = app();
        let id = new_session(&app).await;
        send(
            &app,
            "POST",
            &format!("/sessions/{id}/mine?wait=true"),
            Some(serde_json::json!({ "data": "Alice pays Bob 10", "difficulty": 1 })),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/tamper"),
            Some(serde_json::json!({ "index": 0, "data": "forged" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["audit"]["findings"][0]["kind"], "broken_link");
        assert_eq!(body["audit"]["findings"][0]["index"], 1);

        let (_, report) = send(&app, "GET", &format!("/sessions/{id}/chain/audit"), None).await;
        assert_eq!(report["findings"].as_array().unwrap().len(), 0);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/sessions/{id}/tamper"),
            Some(serde_json::json!({ "index": 9, "data": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_graph_formats() {
        let app = app();
        let id = new_session(&app).await;
        let request = Request::builder()
            .uri(format!("/sessions/{id}/graph"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            DOT_CONTENT_TYPE
        );
        let dot = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&dot).starts_with("digraph chain {"));

        let (_, graph) = send(&app, "GET", &format!("/sessions/{id}/graph?format=json"), None).await;
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 1);
        assert_eq!(graph["edges"].as_array().unwrap().len(), 0);
    }
}
