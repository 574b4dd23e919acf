//! Route handlers.

use askama::Template;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use tracing::debug;

use hangfire_metrics::{CONTENT_TYPE, render_prometheus};

use crate::ApiState;

// ── Landing page ───────────────────────────────────────────────

#[derive(Template)]
#[template(
    source = r#"<html>
<head><title>Hangfire Exporter</title></head>
<body>
<h1>Hangfire Exporter</h1>
<p><a href="{{ metrics_path }}">Metrics</a></p>
</body>
</html>
"#,
    ext = "html"
)]
struct LandingTemplate<'a> {
    metrics_path: &'a str,
}

/// GET /
pub async fn landing_page(State(state): State<ApiState>) -> Html<String> {
    let page = LandingTemplate {
        metrics_path: &state.metrics_path,
    };
    Html(
        page.render()
            .unwrap_or_else(|e| format!("<pre>Template error: {e}</pre>")),
    )
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET <metrics_path>
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let samples = state.collector.collect().await;
    let body = render_prometheus(&samples);
    debug!(samples = samples.len(), bytes = body.len(), "scrape served");

    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}
