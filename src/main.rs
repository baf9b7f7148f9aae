// Módulos de la aplicación
mod api;
mod app_state;
mod config;
mod confidence;
mod llm;
mod models;
mod taxonomy;

use std::sync::Arc;

use crate::app_state::AppState;
use crate::taxonomy::TaxonomyStore;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env().expect("Error al cargar la configuración");

    // 3. Cargar la taxonomía: sin ella no hay servicio, fallo fatal
    let taxonomy = Arc::new(
        TaxonomyStore::load(&cfg.taxonomy_path).expect("Error cargando la taxonomía"),
    );

    // 4. Construir el analizador con sus dependencias explícitas
    let analyzer = Arc::new(llm::SpendAnalyzer::new(cfg.clone(), taxonomy.clone()));

    // 5. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        taxonomy,
        analyzer,
    };

    // 6. Configurar el router de la API y el servicio de ficheros estáticos
    let app = Router::new()
        .merge(api::create_router(app_state))
        .fallback_service(ServeDir::new("frontend"))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 7. Iniciar el servidor
    let listener = tokio::net::TcpListener::bind(&cfg.server_addr)
        .await
        .unwrap();
    let server_url = format!("http://{}", cfg.server_addr);
    info!("🚀 Servidor escuchando en {}", &server_url);

    // Abrir el frontend en el navegador por defecto
    if webbrowser::open(&server_url).is_err() {
        info!(
            "No se pudo abrir el navegador. Por favor, accede a {} manualmente.",
            server_url
        );
    }

    axum::serve(listener, app).await.unwrap();
}
