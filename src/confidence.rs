//! Motor de confianza: deriva una etiqueta determinista y auditable de la
//! divergencia entre la categoría primaria y la alternativa.
//!
//! La confianza nunca la declara el modelo (no es fiable ni verificable);
//! se calcula aquí a partir de la distancia entre dos elecciones razonadas
//! de forma independiente. Función pura, sin efectos secundarios.

use crate::models::{CategoryPath, ClassificationResult, Confidence};

/// Nombres de clave de cada nivel, en el orden fijo de recorrido.
const LEVEL_KEYS: [&str; 4] = ["level1", "level2", "level3", "level4"];

/// Normaliza un valor de nivel para compararlo: sin espacios en los
/// extremos y sin distinción de mayúsculas.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Una ruta sin nivel 1 útil no es una alternativa bien formada.
fn is_well_formed(path: &CategoryPath) -> bool {
    !path.level1.trim().is_empty()
}

/// Profundidad más superficial en la que ambas rutas difieren, saltando los
/// niveles vacíos en ambas (rutas que terminan antes del nivel 4).
/// Efímera: se calcula y se traduce a etiqueta, nunca se almacena.
fn first_divergence(primary: &CategoryPath, alternative: &CategoryPath) -> Option<usize> {
    for depth in 1..=4 {
        let a = normalize(primary.level(depth));
        let b = normalize(alternative.level(depth));
        if a.is_empty() && b.is_empty() {
            continue;
        }
        if a != b {
            return Some(depth);
        }
    }
    None
}

/// Calcula la etiqueta de confianza y el detalle legible que un revisor
/// humano inspecciona. Determinista: entradas idénticas producen salida
/// idéntica byte a byte, sin volver a llamar al modelo.
pub fn compute_confidence(
    primary: &CategoryPath,
    alternative: Option<&CategoryPath>,
) -> (Confidence, String) {
    let Some(alternative) = alternative.filter(|alt| is_well_formed(alt)) else {
        return (
            Confidence::High,
            "No plausible alternative was proposed; the classification is treated as unambiguous."
                .to_string(),
        );
    };

    match first_divergence(primary, alternative) {
        None => (
            Confidence::High,
            "Primary and alternative classifications are identical at every populated level."
                .to_string(),
        ),
        Some(depth) => {
            let label = match depth {
                1 | 2 => Confidence::Low,
                3 => Confidence::Medium,
                _ => Confidence::High,
            };
            let detail = format!(
                "Primary and alternative first diverge at level {depth} ({}): \
                 primary '{}' vs alternative '{}'.",
                LEVEL_KEYS[depth - 1],
                primary.level(depth).trim(),
                alternative.level(depth).trim(),
            );
            (label, detail)
        }
    }
}

/// Sobrescribe los campos de confianza de un resultado con los valores
/// calculados. Se invoca exactamente una vez por clasificación; lo que el
/// modelo hubiera propuesto se descarta.
pub fn apply_confidence(mut result: ClassificationResult) -> ClassificationResult {
    let (confidence, reason) = compute_confidence(
        &result.primary,
        result.alternative.as_ref().map(|alt| &alt.path),
    );
    result.confidence = confidence;
    result.confidence_reason = reason;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlternativeCategory;

    fn path(l1: &str, l2: &str, l3: &str, l4: Option<&str>) -> CategoryPath {
        CategoryPath {
            level1: l1.to_string(),
            level2: l2.to_string(),
            level3: l3.to_string(),
            level4: l4.map(str::to_string),
        }
    }

    #[test]
    fn sin_alternativa_es_confianza_alta() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let (label, detail) = compute_confidence(&primary, None);
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("No plausible alternative"));
    }

    #[test]
    fn alternativa_mal_formada_cuenta_como_ausente() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let blank = path("   ", "", "", None);
        let (label, detail) = compute_confidence(&primary, Some(&blank));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("No plausible alternative"));
    }

    #[test]
    fn rutas_identicas_son_confianza_alta() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let alternative = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("identical"));
    }

    #[test]
    fn la_etiqueta_depende_del_nivel_de_divergencia() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let cases = [
            (path("Indirect", "Services", "IT", Some("Cloud")), Confidence::Low),
            (path("Direct", "Packaging", "Boxes", Some("Cardboard")), Confidence::Low),
            (path("Direct", "Raw Materials", "Plastics", Some("PVC")), Confidence::Medium),
            (path("Direct", "Raw Materials", "Metals", Some("Aluminum")), Confidence::High),
        ];
        for (alternative, expected) in cases {
            let (label, _) = compute_confidence(&primary, Some(&alternative));
            assert_eq!(label, expected, "alternativa: {alternative:?}");
        }
    }

    #[test]
    fn solo_importa_el_primer_punto_de_diferencia() {
        // Difieren primero en el nivel 2; los niveles posteriores no cambian nada.
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let a = path("Direct", "Packaging", "Metals", Some("Steel"));
        let b = path("Direct", "Packaging", "Foil", Some("Aluminum"));
        let (label_a, detail_a) = compute_confidence(&primary, Some(&a));
        let (label_b, detail_b) = compute_confidence(&primary, Some(&b));
        assert_eq!(label_a, Confidence::Low);
        assert_eq!(label_b, Confidence::Low);
        assert!(detail_a.contains("level 2"));
        assert!(detail_b.contains("level 2"));
    }

    #[test]
    fn mayusculas_y_espacios_no_divergen() {
        let primary = path(" Goods ", "Raw Materials", "Metals", None);
        let alternative = path("goods", "raw materials", "METALS", None);
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("identical"));
    }

    #[test]
    fn niveles_vacios_en_ambas_rutas_se_saltan() {
        // Ninguna de las dos tiene nivel 4: no debe marcarse divergencia ahí.
        let primary = path("Direct", "Raw Materials", "Metals", None);
        let alternative = path("Direct", "Raw Materials", "Metals", Some("  "));
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("identical"));
    }

    #[test]
    fn nivel4_presente_solo_en_una_ruta_si_diverge() {
        let primary = path("Direct", "Raw Materials", "Metals", None);
        let alternative = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("level 4"));
        assert!(detail.contains("Steel"));
    }

    #[test]
    fn es_idempotente_byte_a_byte() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let alternative = path("Direct", "Raw Materials", "Plastics", Some("PVC"));
        let first = compute_confidence(&primary, Some(&alternative));
        let second = compute_confidence(&primary, Some(&alternative));
        assert_eq!(first, second);
    }

    #[test]
    fn escenario_acero_contra_aluminio() {
        let primary = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let alternative = path("Direct", "Raw Materials", "Metals", Some("Aluminum"));
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::High);
        assert!(detail.contains("level 4"));
        assert!(detail.contains("Steel"));
        assert!(detail.contains("Aluminum"));
    }

    #[test]
    fn escenario_pilar_contestado() {
        let primary = path("Indirect", "Services", "IT", Some("Cloud Hosting"));
        let alternative = path("Direct", "Raw Materials", "Metals", Some("Steel"));
        let (label, detail) = compute_confidence(&primary, Some(&alternative));
        assert_eq!(label, Confidence::Low);
        assert!(detail.contains("level 1"));
        assert!(detail.contains("Indirect"));
        assert!(detail.contains("Direct"));
    }

    #[test]
    fn apply_sobrescribe_lo_que_dijera_el_modelo() {
        let result = ClassificationResult {
            primary: path("Direct", "Raw Materials", "Metals", Some("Steel")),
            alternative: Some(AlternativeCategory {
                path: path("Direct", "Raw Materials", "Metals", Some("Aluminum")),
                reason: "Similar alloys".to_string(),
            }),
            reasoning: "Supplier is a steel mill.".to_string(),
            confidence: Confidence::Low,
            confidence_reason: "model-stated, must be discarded".to_string(),
        };
        let result = apply_confidence(result);
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.confidence_reason.contains("level 4"));
    }
}
