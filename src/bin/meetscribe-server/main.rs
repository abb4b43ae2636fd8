use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use meetscribe::capability::WorkerPool;
use meetscribe::config::Config;
use meetscribe::mock::{MockAsr, MockSv, MockVad};
use meetscribe::session::Session;
use meetscribe::wire::WsQueryParams;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, warn};

mod metrics;

#[derive(Parser, Debug)]
#[command(name = "meetscribe-server")]
#[command(about = "WebSocket server for real-time streaming speech analysis")]
struct Params {
    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8088)]
    port: u16,

    /// Worker pool size for model capability calls.
    #[arg(long = "workers", default_value_t = 4)]
    workers: usize,
}

/// The "no real model wired in" default used by this binary: VAD never reports a
/// boundary, ASR never returns a candidate, SV always scores zero. It exists to exercise
/// the HTTP/WS surface end-to-end; a production deployment swaps these for real
/// `Vad`/`Asr`/`Sv` implementations behind the same traits.
type ServerVad = MockVad;
type ServerAsr = MockAsr;
type ServerSv = MockSv<fn(&[f32], &[f32]) -> f32>;

fn silent_sv_score(_a: &[f32], _b: &[f32]) -> f32 {
    0.0
}

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    vad: Arc<ServerVad>,
    asr: Arc<ServerAsr>,
    sv: Arc<ServerSv>,
    pool: WorkerPool,
}

#[tokio::main]
async fn main() {
    meetscribe::logging::init();

    if let Err(err) = run().await {
        error!(error = ?err, "meetscribe-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    if let Err(err) = metrics::init() {
        warn!(error = ?err, "metrics disabled (init failed)");
    }

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let mut config = Config::default();
    config.thread_pool_max_workers = params.workers;

    let state = AppState {
        config: Arc::new(config),
        vad: Arc::new(MockVad::new(Vec::new())),
        asr: Arc::new(MockAsr::new(Vec::new())),
        sv: Arc::new(MockSv::new(silent_sv_score as fn(&[f32], &[f32]) -> f32)),
        pool: WorkerPool::new(params.workers),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/ws/transcribe", get(ws_transcribe))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_transcribe(
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let opts = params.into_session_opts();
    ws.on_upgrade(move |socket| handle_socket(socket, state, opts))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    opts: meetscribe::config::SessionOpts,
) {
    metrics::session_accepted();
    let mut session = Session::new(
        state.config.clone(),
        opts,
        state.vad.clone(),
        state.asr.clone(),
        state.sv.clone(),
        state.pool.clone(),
    );
    info!(session_id = %session.session_id(), "session accepted");

    let close_reason = loop {
        match socket.recv().await {
            Some(Ok(Message::Binary(bytes))) => {
                let start = Instant::now();
                let events = session.push_bytes(&bytes).await;
                metrics::observe_push_latency("ok", start.elapsed().as_secs_f64());
                metrics::segments_emitted(events.len() as u64);

                let mut send_failed = false;
                for event in events {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(error = %err, "failed to encode outbound event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        send_failed = true;
                        break;
                    }
                }
                if send_failed {
                    break "transport_send_failed";
                }
            }
            Some(Ok(Message::Close(_))) => break "disconnect",
            // Non-binary inbound messages are ignored per the wire contract.
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                warn!(error = %err, "transport error on recv");
                break "transport_error";
            }
            None => break "disconnect",
        }
    };

    info!(session_id = %session.session_id(), reason = close_reason, "session closed");
    metrics::session_closed(close_reason);
}
