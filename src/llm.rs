//! Cliente de clasificación y continuación de conversación sobre Rig/OpenAI.
//!
//! El analizador recibe su configuración y la taxonomía por inyección en la
//! construcción; el cliente OpenAI se construye perezosamente en el primer
//! uso y se reutiliza durante toda la vida del proceso.

use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Result};
use rig::completion::{Chat, Message, Prompt};
use rig::providers::openai;
use tracing::error;

use crate::config::AppConfig;
use crate::confidence;
use crate::models::{ClassificationResult, ConversationTurn, Role, SpendItem};
use crate::taxonomy::TaxonomyStore;

/// Contrato de comportamiento del chat de seguimiento sobre un item.
const CHAT_PREAMBLE: &str = r#"
You are a procurement and spend analysis assistant discussing a single spend
item that you previously categorized.
Be concise and professional.
If the user proposes a different category, evaluate it honestly: either defend
your original categorization or explicitly revise it.
Keep replies under roughly 200 words unless more detail is explicitly requested.
"#;

/// Pregunta por defecto cuando el historial no termina en un turno de usuario.
const DEFAULT_CHAT_PROMPT: &str = "Please explain how you categorized this item.";

/// Construye el mensaje de grounding que se envía como preámbulo de cada
/// clasificación: la taxonomía completa más el contrato de respuesta.
fn grounding_prompt(taxonomy_json: &str) -> String {
    format!(
        r#"You are an expert procurement and spend analysis assistant.
Your task is to categorize invoice data into the provided taxonomy.

Taxonomy structure:
{taxonomy_json}

For each input record you must provide:
1. "primary": the best matching category path, with "level1", "level2",
   "level3" and, when the taxonomy goes that deep, "level4".
2. "alternative": the second most plausible category as a full path
   ("level1" through "level4") plus a short "reason" justifying it,
   or null if no plausible alternative exists.
3. "reasoning": explain why you chose the primary category.
   - CRITICAL: if the case is ambiguous or there is a reason you might be
     wrong, state it clearly.
   - Highlight conflicting keywords (e.g. the supplier suggests one thing
     but the description suggests another).

Rules:
- Use only category names that appear in the taxonomy above. Never invent
  category names.
- Do NOT report a confidence level. Confidence is computed downstream from
  how far apart your primary and alternative choices are.

Output a single JSON object:
{{
  "primary": {{"level1": "...", "level2": "...", "level3": "...", "level4": "..."}},
  "alternative": {{"level1": "...", "level2": "...", "level3": "...", "level4": "...", "reason": "..."}},
  "reasoning": "..."
}}"#
    )
}

/// Extrae el objeto JSON de la respuesta del modelo (con o sin vallas de
/// código) y lo convierte en un resultado de clasificación.
fn parse_classification(raw: &str) -> Result<ClassificationResult> {
    let json = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str::<ClassificationResult>(json).map_err(|e| {
        anyhow!("No se pudo parsear la respuesta del modelo: {e}. Respuesta: '{raw}'")
    })
}

/// Contexto que ancla el chat en la decisión previa: el item y el
/// razonamiento original se anteponen como un intercambio sintético,
/// sin mutar el historial real.
struct ConversationContext<'a> {
    item: &'a SpendItem,
    prior_reasoning: &'a str,
}

impl ConversationContext<'_> {
    fn grounding_turns(&self) -> Vec<Message> {
        vec![
            Message::user(format!(
                "We are discussing this spend item: {}",
                self.item.as_prompt_line()
            )),
            Message::assistant(format!(
                "I categorized this item earlier. My reasoning was: {}",
                self.prior_reasoning
            )),
        ]
    }
}

/// Separa el historial suministrado en (historial previo, pregunta actual):
/// el último turno de usuario es la pregunta; si no lo hay, se usa una
/// pregunta por defecto y el historial se conserva entero.
fn split_prompt(turns: &[ConversationTurn]) -> (&[ConversationTurn], String) {
    match turns.split_last() {
        Some((last, rest)) if last.role == Role::User => (rest, last.content.clone()),
        _ => (turns, DEFAULT_CHAT_PROMPT.to_string()),
    }
}

/// Historial completo para el backend: turnos sintéticos de grounding
/// seguidos del historial real, en orden.
fn build_chat_history(
    context: &ConversationContext<'_>,
    turns: &[ConversationTurn],
) -> Vec<Message> {
    let mut history = context.grounding_turns();
    for turn in turns {
        history.push(match turn.role {
            Role::User => Message::user(turn.content.clone()),
            Role::Assistant => Message::assistant(turn.content.clone()),
        });
    }
    history
}

/// Analizador de gasto: clasifica items contra la taxonomía y mantiene
/// conversaciones de seguimiento sobre clasificaciones previas.
pub struct SpendAnalyzer {
    config: AppConfig,
    system_prompt: String,
    client: OnceLock<openai::Client>,
}

impl SpendAnalyzer {
    /// Construye el analizador con sus dependencias explícitas. El prompt
    /// de grounding se genera una sola vez: la taxonomía es inmutable.
    pub fn new(config: AppConfig, taxonomy: Arc<TaxonomyStore>) -> Self {
        Self {
            config,
            system_prompt: grounding_prompt(&taxonomy.to_prompt_json()),
            client: OnceLock::new(),
        }
    }

    /// Cliente OpenAI construido en el primer uso y cacheado. La clave
    /// ausente se señala aquí como error de configuración, no al arrancar.
    fn client(&self) -> Result<&openai::Client> {
        use rig::client::ProviderClient as _;

        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        self.config.require_api_key()?;
        Ok(self.client.get_or_init(|| openai::Client::from_env()))
    }

    /// Clasifica una línea de gasto. Nunca propaga un fallo: cualquier
    /// error del ciclo petición/respuesta se registra y se convierte en el
    /// resultado centinela "Error / API Failure" para que la UI no caiga.
    pub async fn classify(&self, item: &SpendItem) -> ClassificationResult {
        match self.request_classification(item).await {
            Ok(result) => confidence::apply_confidence(result),
            Err(err) => {
                error!(
                    "Fallo del backend clasificando el item de '{}': {err:#}",
                    item.supplier
                );
                ClassificationResult::backend_failure(&format!("{err:#}"))
            }
        }
    }

    async fn request_classification(&self, item: &SpendItem) -> Result<ClassificationResult> {
        use rig::client::CompletionClient as _;

        let agent = self
            .client()?
            .agent(&self.config.chat_model)
            .preamble(&self.system_prompt)
            .build();

        let response = agent.prompt(item.as_prompt_line()).await?;
        parse_classification(&response)
    }

    /// Continúa la conversación sobre un item ya clasificado. Devuelve
    /// siempre algún texto: un fallo del backend se registra y se entrega
    /// como mensaje de error en lugar de tirar el turno.
    pub async fn chat_about_item(
        &self,
        item: &SpendItem,
        prior_reasoning: &str,
        turns: &[ConversationTurn],
    ) -> String {
        match self.request_chat(item, prior_reasoning, turns).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(
                    "Fallo del backend en el chat sobre el item de '{}': {err:#}",
                    item.supplier
                );
                format!("Error: {err:#}")
            }
        }
    }

    async fn request_chat(
        &self,
        item: &SpendItem,
        prior_reasoning: &str,
        turns: &[ConversationTurn],
    ) -> Result<String> {
        use rig::client::CompletionClient as _;

        let context = ConversationContext {
            item,
            prior_reasoning,
        };
        let (rest, prompt) = split_prompt(turns);
        let history = build_chat_history(&context, rest);

        let agent = self
            .client()?
            .agent(&self.config.chat_model)
            .preamble(CHAT_PREAMBLE)
            .build();

        let reply = agent.chat(prompt, history).await?;
        Ok(reply)
    }
}
