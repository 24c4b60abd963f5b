//! Thin HTTP/WebSocket surface over the analytics core. No algorithmic
//! content here: handlers validate-by-delegation, marshal JSON and map
//! the error taxonomy onto status codes.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::data::store::Database;
use crate::error::QuantStreamError;
use crate::events::LivePacket;
use crate::services::alert_engine::AlertEngine;
use crate::services::chart_data::{chart_data, ChartQuery};
use crate::services::live_session::LiveSession;

pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub alerts: AlertEngine,
}

pub async fn run_server(state: Arc<AppState>) {
    let bind_addr = state.config.bind_addr.clone();
    let app = Router::new()
        .route("/", get(read_root))
        .route("/api/symbols", get(get_symbols))
        .route("/api/detailsymbols", get(get_detail_symbols))
        .route("/api/chart-data", get(get_chart_data))
        .route("/ws/live-data/{y_symbol}/{x_symbol}", get(ws_live_data))
        .route("/api/alerts", post(create_alert).get(list_alerts))
        .route("/api/alerts/{id}", delete(delete_alert))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind API server");
    info!("API server listening on {}", bind_addr);
    axum::serve(listener, app).await.expect("API server failed");
}

fn error_response(e: QuantStreamError) -> (StatusCode, Json<serde_json::Value>) {
    let status = if e.is_validation() {
        StatusCode::BAD_REQUEST
    } else if e.is_insufficient_data() {
        StatusCode::NOT_FOUND
    } else {
        error!("Request failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "detail": e.to_string() })))
}

async fn read_root() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to the QuantStream analytics API!" }))
}

async fn get_symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.supported_symbols())
}

async fn get_detail_symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config.symbols.clone())
}

#[derive(Deserialize)]
struct ChartParams {
    y_symbol: String,
    x_symbol: String,
    #[serde(default = "default_timeframe")]
    timeframe: String,
    #[serde(default = "default_window")]
    window: usize,
}

fn default_timeframe() -> String {
    "1m".to_string()
}

fn default_window() -> usize {
    50
}

async fn get_chart_data(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> impl IntoResponse {
    let query = ChartQuery {
        y_symbol: params.y_symbol,
        x_symbol: params.x_symbol,
        timeframe: params.timeframe,
        window: params.window,
    };
    match chart_data(&state.db, &state.config, &query) {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn ws_live_data(
    State(state): State<Arc<AppState>>,
    Path((y_symbol, x_symbol)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_live_socket(socket, state, y_symbol, x_symbol))
}

async fn handle_live_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    y_symbol: String,
    x_symbol: String,
) {
    info!("WebSocket connection accepted for pair: {}/{}", y_symbol, x_symbol);

    let session = match LiveSession::initialize(state.db.clone(), &state.config, &y_symbol, &x_symbol)
    {
        Ok(session) => session,
        Err(e) => {
            error!("[{}/{}] Session initialization failed: {}", y_symbol, x_symbol, e);
            let _ = socket
                .send(Message::Text(
                    json!({ "type": "error", "detail": e.to_string() }).to_string().into(),
                ))
                .await;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let (tx, mut rx) = mpsc::channel::<LivePacket>(16);
    tokio::spawn(session.run(tx));

    // Forward packets until either side goes away. Dropping `rx` closes
    // the channel, which terminates the session loop within a cadence.
    loop {
        tokio::select! {
            packet = rx.recv() => {
                let Some(packet) = packet else { break };
                let text = match serde_json::to_string(&packet) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Failed to serialize live packet: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                // Any client close or transport error ends the session.
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
    info!("WebSocket closed for pair: {}/{}", y_symbol, x_symbol);
}

#[derive(Deserialize)]
struct CreateAlertRequest {
    symbol_pair: String,
    metric: String,
    condition: String,
    value: f64,
}

async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlertRequest>,
) -> impl IntoResponse {
    match state
        .alerts
        .create(&req.symbol_pair, &req.metric, &req.condition, req.value)
    {
        Ok(rule) => Json(json!({
            "id": rule.id,
            "symbol_pair": rule.symbol_pair,
            "metric": rule.metric,
            "condition": rule.condition,
            "value": rule.value,
            "status": rule.status,
            "created_at": rule.created_at,
        }))
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

#[derive(Deserialize)]
struct ListAlertParams {
    symbol_pair: Option<String>,
}

async fn list_alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListAlertParams>,
) -> impl IntoResponse {
    match state.alerts.list(params.symbol_pair.as_deref()) {
        Ok(rules) => {
            let rows: Vec<_> = rules
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "symbol_pair": r.symbol_pair,
                        "metric": r.metric,
                        "condition": r.condition,
                        "value": r.value,
                        "status": r.status,
                        "created_at": r.created_at,
                    })
                })
                .collect();
            Json(rows).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn delete_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.alerts.delete(id) {
        Ok(()) => Json(json!({ "deleted": id })).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}
