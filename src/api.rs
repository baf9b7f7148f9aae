use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    app_state::AppState,
    models::{AnalyzedRow, ConversationTurn, SpendItem},
    taxonomy::TaxonomyNode,
};

// --- Payloads y Respuestas de la API ---

/// Filas ya decodificadas de la hoja subida. La mecánica de la hoja de
/// cálculo vive en el cliente; aquí sólo llegan registros discretos.
#[derive(Deserialize)]
pub struct UploadPayload {
    rows: Vec<SpendItem>,
}

#[derive(Deserialize)]
pub struct ChatPayload {
    #[serde(flatten)]
    item: SpendItem,
    reasoning: String,
    #[serde(default)]
    messages: Vec<ConversationTurn>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    reply: String,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/chat", post(chat_handler))
        .route("/taxonomy", get(taxonomy_handler))
        .with_state(app_state)
}

// --- Handlers ---

/// Clasifica cada fila de forma independiente: el fallo de una fila produce
/// su fila centinela y nunca contamina al resto del lote.
#[axum::debug_handler]
async fn upload_handler(
    State(state): State<AppState>,
    Json(payload): Json<UploadPayload>,
) -> Json<Vec<AnalyzedRow>> {
    let limit = state.config.upload_row_limit;
    let total = payload.rows.len();
    if total > limit {
        info!("Subida con {total} filas; se clasifican las primeras {limit}.");
    }

    let mut results = Vec::with_capacity(total.min(limit));
    for (id, item) in payload.rows.into_iter().take(limit).enumerate() {
        info!("[{}/{}] Clasificando item de '{}'...", id + 1, total.min(limit), item.supplier);
        let analysis = state.analyzer.classify(&item).await;
        results.push(AnalyzedRow {
            id,
            original: item,
            analysis,
        });
    }

    Json(results)
}

/// Chat sobre la categorización de un item concreto. Siempre responde con
/// algún texto; los fallos del backend llegan como mensaje de error.
#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Json<ChatResponse> {
    let reply = state
        .analyzer
        .chat_about_item(&payload.item, &payload.reasoning, &payload.messages)
        .await;
    Json(ChatResponse { reply })
}

/// Consulta de sólo lectura: el árbol tal y como se cargó al arrancar.
#[axum::debug_handler]
async fn taxonomy_handler(State(state): State<AppState>) -> Json<TaxonomyNode> {
    Json(state.taxonomy.root().clone())
}
