use std::net::SocketAddr;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    admin, auth, config::AppConfig, error::ServerErrorDetail, feedback, history, predict,
    state::AppState,
};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "SleepMetrics API is running..." }))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(history::router())
                .merge(feedback::router())
                .merge(predict::router())
                .merge(admin::router())
                .route("/health", get(|| async { "ok" })),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_error_detail,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

/// In development, 500 bodies also carry the underlying error as `error`.
async fn expose_error_detail(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    if !state.config.environment.is_development() {
        return res;
    }
    let Some(detail) = res.extensions().get::<ServerErrorDetail>().cloned() else {
        return res;
    };
    let status = res.status();
    (
        status,
        Json(json!({ "message": detail.message, "error": detail.detail })),
    )
        .into_response()
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
