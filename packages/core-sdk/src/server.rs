use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{bridge::Bridge, models::RawInputs, telemetry};

#[derive(Serialize, Debug)]
struct InvokeReply {
    result: String,
}

/**
 * \brief 构建本地 HTTP 路由，便于测试直接驱动。
 */
pub fn router(bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/api/invoke", post(invoke))
        .route("/api/health", get(health_check))
        .with_state(bridge)
}

/**
 * \brief 启动本地 HTTP 服务，把 `/api/invoke` 转发给 Bridge。
 * \param addr 监听地址，如 "127.0.0.1:5173"
 */
pub async fn run(addr: &str, bridge: Bridge) -> Result<()> {
    let app = router(Arc::new(bridge));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on http://{}", addr);
    telemetry::log_event("server.run", &format!("listening on {}", addr));
    axum::serve(listener, app).await?;
    Ok(())
}

/**
 * \brief 执行一次调用；请求体无法解析时同样以 200 + `Error: ...` 文本返回。
 */
async fn invoke(
    State(bridge): State<Arc<Bridge>>,
    payload: Result<Json<RawInputs>, JsonRejection>,
) -> Json<InvokeReply> {
    let result = match payload {
        Ok(Json(raw)) => bridge.invoke(&raw).await,
        Err(rejection) => {
            telemetry::log_error("server.invoke", &format!("bad request body: {}", rejection.status()));
            format!("Error: invalid request body: {}", rejection.body_text())
        }
    };
    Json(InvokeReply { result })
}

async fn health_check(State(bridge): State<Arc<Bridge>>) -> Json<serde_json::Value> {
    let defaults = bridge.defaults();
    Json(serde_json::json!({
        "ok": true,
        "default_provider": defaults.provider,
        "default_model": defaults.model,
    }))
}
