use anyhow::{Context, Result};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts as PromOpts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

struct Metrics {
    registry: Registry,
    sessions_accepted_total: IntCounter,
    sessions_active: IntGauge,
    sessions_closed_total: IntCounterVec,
    segments_emitted_total: IntCounter,
    capability_errors_total: IntCounterVec,
    segment_latency_seconds: HistogramVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build_metrics() -> Result<Metrics> {
    let registry = Registry::new();

    let sessions_accepted_total = IntCounter::new(
        "meetscribe_sessions_accepted_total",
        "Total WebSocket sessions accepted.",
    )
    .context("invalid definition for meetscribe_sessions_accepted_total")?;

    let sessions_active = IntGauge::new(
        "meetscribe_sessions_active",
        "Current number of open streaming sessions.",
    )
    .context("invalid definition for meetscribe_sessions_active")?;

    let sessions_closed_total = IntCounterVec::new(
        PromOpts::new(
            "meetscribe_sessions_closed_total",
            "Total sessions closed, by reason.",
        ),
        &["reason"],
    )
    .context("invalid definition for meetscribe_sessions_closed_total")?;

    let segments_emitted_total = IntCounter::new(
        "meetscribe_segments_emitted_total",
        "Total transcription events emitted across all sessions.",
    )
    .context("invalid definition for meetscribe_segments_emitted_total")?;

    let capability_errors_total = IntCounterVec::new(
        PromOpts::new(
            "meetscribe_capability_errors_total",
            "Total recovered VAD/ASR/SV capability errors, by stage.",
        ),
        &["stage"],
    )
    .context("invalid definition for meetscribe_capability_errors_total")?;

    let segment_latency_seconds = HistogramVec::new(
        HistogramOpts::new(
            "meetscribe_segment_latency_seconds",
            "Wall-clock time spent processing one binary frame push.",
        ),
        &["outcome"],
    )
    .context("invalid definition for meetscribe_segment_latency_seconds")?;

    registry
        .register(Box::new(sessions_accepted_total.clone()))
        .context("failed to register meetscribe_sessions_accepted_total")?;
    registry
        .register(Box::new(sessions_active.clone()))
        .context("failed to register meetscribe_sessions_active")?;
    registry
        .register(Box::new(sessions_closed_total.clone()))
        .context("failed to register meetscribe_sessions_closed_total")?;
    registry
        .register(Box::new(segments_emitted_total.clone()))
        .context("failed to register meetscribe_segments_emitted_total")?;
    registry
        .register(Box::new(capability_errors_total.clone()))
        .context("failed to register meetscribe_capability_errors_total")?;
    registry
        .register(Box::new(segment_latency_seconds.clone()))
        .context("failed to register meetscribe_segment_latency_seconds")?;

    Ok(Metrics {
        registry,
        sessions_accepted_total,
        sessions_active,
        sessions_closed_total,
        segments_emitted_total,
        capability_errors_total,
        segment_latency_seconds,
    })
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

pub fn init() -> Result<()> {
    if metrics().is_some() {
        return Ok(());
    }
    let built = build_metrics()?;
    let _ = METRICS.set(built);
    Ok(())
}

pub fn session_accepted() {
    if let Some(m) = metrics() {
        m.sessions_accepted_total.inc();
        m.sessions_active.inc();
    }
}

pub fn session_closed(reason: &str) {
    if let Some(m) = metrics() {
        m.sessions_active.dec();
        m.sessions_closed_total.with_label_values(&[reason]).inc();
    }
}

pub fn segments_emitted(n: u64) {
    if let Some(m) = metrics() {
        m.segments_emitted_total.inc_by(n);
    }
}

pub fn capability_error(stage: &str) {
    if let Some(m) = metrics() {
        m.capability_errors_total.with_label_values(&[stage]).inc();
    }
}

pub fn observe_push_latency(outcome: &str, seconds: f64) {
    if let Some(m) = metrics() {
        m.segment_latency_seconds
            .with_label_values(&[outcome])
            .observe(seconds);
    }
}

pub async fn prometheus_metrics() -> Response {
    if metrics().is_none()
        && let Err(err) = init()
    {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to initialize metrics: {err:#}"),
        )
            .into_response();
    }

    let Some(metrics) = metrics() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics not initialized").into_response();
    };

    let families = metrics.registry.gather();
    let mut buf = Vec::new();
    if TextEncoder::new().encode(&families, &mut buf).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to encode metrics",
        )
            .into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
        )],
        buf,
    )
        .into_response()
}
