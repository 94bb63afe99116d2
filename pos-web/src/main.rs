//! Servidor web Axum com WebSocket para visualização do etiquetador POS em tempo real

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use pos_core::{
    corpus::{corpus_sentences, demo_texts, read_corpus},
    pipeline::{PipelineEvent, PosPipeline, TaggedToken},
    Lexicons, TaggerConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Estado compartilhado da aplicação
struct AppState {
    pipeline: PosPipeline,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    tagged_tokens: Vec<TaggedToken>,
    processing_ms: u64,
    total_tokens: usize,
}

/// Corpus `palavra/TAG` (uma sentença por linha). Sem corpus, avalia o corpus embutido.
#[derive(Deserialize)]
struct EvaluateRequest {
    #[serde(default)]
    corpus: Option<String>,
    #[serde(default = "default_separator")]
    separator: char,
}

fn default_separator() -> char {
    '/'
}

/// Mensagem WebSocket recebida do cliente
#[derive(Deserialize)]
struct WsRequest {
    text: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::var("POS_CONFIG") {
        Ok(path) => {
            info!(%path, "loading tagger config");
            TaggerConfig::from_path(&path)?
        }
        Err(_) => TaggerConfig::default(),
    };

    let pipeline = PosPipeline::train(&corpus_sentences(), &config)?;
    let state = Arc::new(AppState { pipeline });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/evaluate", post(evaluate_handler))
        .route("/lexicons", get(lexicons_handler))
        .route("/ws", get(ws_handler))
        .route("/demo-texts", get(demo_texts_handler))
        .layer(cors)
        .with_state(state);

    let addr = std::env::var("POS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor POS iniciado em http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message.into()})),
    )
        .into_response()
}

/// Etiquetagem via HTTP POST (sem streaming)
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return bad_request("Texto vazio");
    }

    let start = Instant::now();
    match state.pipeline.analyze(&req.text) {
        Ok(tagged) => Json(AnalyzeResponse {
            total_tokens: tagged.len(),
            tagged_tokens: tagged,
            processing_ms: start.elapsed().as_millis() as u64,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Avaliação (modo EVALUATE) sobre um corpus anotado
async fn evaluate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let corpus = match req.corpus {
        Some(text) => match read_corpus(text.as_bytes(), req.separator) {
            Ok(sentences) => sentences,
            Err(e) => return bad_request(e.to_string()),
        },
        None => corpus_sentences(),
    };

    let result = tokio::task::spawn_blocking(move || state.pipeline.evaluate(&corpus)).await;
    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            warn!(error = %e, "evaluation task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Léxicos finalizados (formas retidas e classes de ambiguidade)
async fn lexicons_handler(State(state): State<Arc<AppState>>) -> Json<Lexicons> {
    Json((*state.pipeline.lexicons()).clone())
}

/// Retorna textos de demonstração
async fn demo_texts_handler() -> impl IntoResponse {
    let texts: Vec<serde_json::Value> = demo_texts()
        .iter()
        .map(|(domain, text)| {
            serde_json::json!({
                "domain": domain,
                "text": text
            })
        })
        .collect();
    Json(texts)
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Lógica do WebSocket: recebe texto, executa o pipeline e envia eventos passo a passo
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                // Aceita JSON {text} ou texto puro
                let text_str = match serde_json::from_str::<WsRequest>(&text) {
                    Ok(req) => req.text.trim().to_string(),
                    Err(_) => text.trim().to_string(),
                };

                if text_str.is_empty() {
                    continue;
                }

                info!("Etiquetando via WebSocket: {} chars", text_str.len());

                let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
                let state_for_thread = Arc::clone(&state);

                // O pipeline é síncrono: roda fora do runtime
                let handle = tokio::task::spawn_blocking(move || {
                    state_for_thread.pipeline.analyze_streaming(&text_str, tx_std);
                });
                if let Err(e) = handle.await {
                    warn!(error = %e, "analysis task failed");
                    continue;
                }

                let events: Vec<PipelineEvent> = rx_std.try_iter().collect();
                for event in &events {
                    if let Ok(json) = serde_json::to_string(event) {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            return; // cliente desconectou
                        }
                        // Pequena pausa para animação visual (passo a passo)
                        tokio::time::sleep(tokio::time::Duration::from_millis(35)).await;
                    }
                }
            }
            Message::Close(_) => {
                info!("WebSocket desconectado");
                return;
            }
            Message::Ping(payload) => {
                let _ = socket.send(Message::Pong(payload)).await;
            }
            _ => {}
        }
    }
}
