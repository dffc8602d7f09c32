//! HTTP surface of the admin modules.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::commands::{ActionContext, ActionOutcome, ModuleRegistry};

pub mod auth;
pub mod render;

pub use auth::{AuthProvider, TokenAuth};
use render::ResponseFormat;

pub struct AppState {
    pub registry: ModuleRegistry,
    pub auth: Arc<dyn AuthProvider>,
    pub display_precision: usize,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub tree: Option<i64>,
    pub format: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/admin/modules", get(list_modules))
        .route("/module/:name/:action", get(module_action))
        .with_state(state)
}

pub async fn health_check() -> Json<HashMap<String, String>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), "healthy".to_string());
    response.insert("service".to_string(), "server-usage".to_string());
    Json(response)
}

pub async fn list_modules(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !state.auth.is_admin(&headers) {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(state.registry.list()).into_response()
}

pub async fn module_action(
    State(state): State<Arc<AppState>>,
    Path((name, action)): Path<(String, String)>,
    Query(query): Query<ActionQuery>,
    headers: HeaderMap,
) -> Response {
    let format = ResponseFormat::parse(query.format.as_deref());

    let Some(module) = state.registry.get(&name) else {
        log::debug!("no module registered as `{}`", name);
        return render::respond(ActionOutcome::NotFound, format, state.display_precision);
    };

    let ctx = ActionContext {
        is_admin: state.auth.is_admin(&headers),
        tree: query.tree,
        cancel: state.shutdown.child_token(),
    };
    let outcome = module.handle_action(&action, ctx).await;
    render::respond(outcome, format, state.display_precision)
}

pub struct UsageServer {
    host: String,
    port: u16,
    state: Arc<AppState>,
}

impl UsageServer {
    pub fn new(host: String, port: u16, state: AppState) -> Self {
        Self {
            host,
            port,
            state: Arc::new(state),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("server usage admin listening on {}", addr);

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                log::info!("shutting down");
                shutdown.cancel();
            })
            .await
            .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

        Ok(())
    }
}
