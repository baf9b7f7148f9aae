//! Modelos de dominio (líneas de gasto, rutas de categoría y resultados
//! de clasificación).

use serde::{Deserialize, Serialize};

/// Una línea de gasto tal y como llega desde la hoja decodificada.
/// Inmutable una vez construida.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendItem {
    #[serde(default, alias = "Supplier")]
    pub supplier: String,
    #[serde(default, alias = "Material")]
    pub material: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Amount")]
    pub amount: f64,
}

impl SpendItem {
    /// Serializa el item como la línea plana que se envía al modelo.
    pub fn as_prompt_line(&self) -> String {
        format!(
            "Supplier: {}, Material: {}, Description: {}, Amount: {}",
            self.supplier, self.material, self.description, self.amount
        )
    }
}

/// Ruta dentro de la taxonomía: pilar → bloque funcional → bucket → sub-bucket.
/// `level4` puede faltar cuando la ruta termina en el nivel 3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryPath {
    #[serde(default)]
    pub level1: String,
    #[serde(default)]
    pub level2: String,
    #[serde(default)]
    pub level3: String,
    #[serde(default)]
    pub level4: Option<String>,
}

impl CategoryPath {
    /// Valor en la profundidad `n` (1..=4); cadena vacía si el nivel no existe.
    pub fn level(&self, n: usize) -> &str {
        match n {
            1 => &self.level1,
            2 => &self.level2,
            3 => &self.level3,
            4 => self.level4.as_deref().unwrap_or(""),
            _ => "",
        }
    }
}

/// Categoría alternativa propuesta por el modelo: ruta completa más la
/// justificación de por qué podría ser la correcta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeCategory {
    #[serde(flatten)]
    pub path: CategoryPath,
    #[serde(default)]
    pub reason: String,
}

/// Etiqueta de confianza calculada por el motor de divergencia.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    None,
}

/// Resultado de una clasificación. Los campos de confianza los sobrescribe
/// siempre el motor de divergencia; nunca se confía en los del modelo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub primary: CategoryPath,
    #[serde(default)]
    pub alternative: Option<AlternativeCategory>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub confidence_reason: String,
}

impl ClassificationResult {
    /// Resultado centinela para fallos del backend. Mantiene viva la UI en
    /// lugar de tumbar el lote: la fila aparece etiquetada como error.
    pub fn backend_failure(detail: &str) -> Self {
        let description = format!(
            "Critical Error: {detail}. This often happens with API gateways \
             if the base URL or API key is incorrect, or if the gateway \
             requires specific headers."
        );
        Self {
            primary: CategoryPath {
                level1: "Error".to_string(),
                level2: "API Failure".to_string(),
                level3: "Check Configurations".to_string(),
                level4: Some(String::new()),
            },
            alternative: None,
            reasoning: description.clone(),
            confidence: Confidence::None,
            confidence_reason: description,
        }
    }
}

/// Rol de un turno de conversación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Un turno del historial de chat. El historial se extiende, nunca se
/// muta en el sitio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

/// Fila anotada que devuelve el endpoint de subida: los datos originales
/// fusionados con el análisis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedRow {
    pub id: usize,
    pub original: SpendItem,
    pub analysis: ClassificationResult,
}
