//! Carga y gestión de configuración de la aplicación (backend LLM + servidor).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Clave del backend. Opcional aquí: su ausencia es un error de
    /// configuración que se señala en el primer uso, no al arrancar.
    pub openai_api_key: Option<String>,
    /// Endpoint alternativo (gateways). Si falta, el cliente usa el
    /// endpoint por defecto del proveedor.
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub taxonomy_path: PathBuf,
    pub server_addr: String,
    /// Máximo de filas clasificadas por subida.
    pub upload_row_limit: usize,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let openai_base_url = env::var("OPENAI_BASE_URL").ok().filter(|u| !u.is_empty());

        let chat_model = env::var("LLM_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let taxonomy_path = PathBuf::from(
            env::var("TAXONOMY_PATH").unwrap_or_else(|_| "taxonomy.json".to_string()),
        );
        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_string());

        let upload_row_limit = match env::var("UPLOAD_ROW_LIMIT") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| anyhow!("UPLOAD_ROW_LIMIT no es un número válido: {raw}"))?,
            Err(_) => 10,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            chat_model,
            taxonomy_path,
            server_addr,
            upload_row_limit,
        })
    }

    /// Clave del backend, o el error de configuración que se propaga al
    /// primer uso del cliente.
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Falta OPENAI_API_KEY en el entorno"))
    }
}
