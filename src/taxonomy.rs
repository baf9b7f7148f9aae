//! Carga y consulta de la taxonomía de categorías de gasto
//! (pilares → bloques funcionales → buckets → sub-buckets).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Profundidad máxima permitida del árbol (pilar, bloque, bucket, sub-bucket).
pub const MAX_DEPTH: usize = 4;

/// Nodo recursivo de la taxonomía. Una rama es un mapa de nombres a hijos;
/// un nivel terminal es una lista de nombres de hoja.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaxonomyNode {
    Branch(BTreeMap<String, TaxonomyNode>),
    Leaves(Vec<String>),
}

impl TaxonomyNode {
    /// Número de niveles de nombres que aporta este nodo (incluido él mismo).
    fn depth(&self) -> usize {
        match self {
            TaxonomyNode::Leaves(_) => 1,
            TaxonomyNode::Branch(children) => {
                1 + children.values().map(TaxonomyNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// Almacén de la taxonomía: se carga una única vez al arrancar y es de
/// sólo lectura durante toda la vida del proceso.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    root: TaxonomyNode,
}

impl TaxonomyStore {
    /// Lee y valida el fichero JSON de la taxonomía. Un fichero ausente,
    /// un JSON inválido o un árbol demasiado profundo son errores fatales
    /// de configuración: no hay taxonomía de reserva.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!("No se pudo leer el fichero de taxonomía: {}", path.display())
        })?;
        let root: TaxonomyNode = serde_json::from_str(&raw).with_context(|| {
            format!("El fichero de taxonomía no es JSON válido: {}", path.display())
        })?;

        if !matches!(root, TaxonomyNode::Branch(_)) {
            return Err(anyhow!(
                "La raíz de la taxonomía debe ser un objeto de pilares, no una lista"
            ));
        }
        let depth = root.depth();
        if depth > MAX_DEPTH {
            return Err(anyhow!(
                "La taxonomía tiene {depth} niveles; el máximo soportado es {MAX_DEPTH}"
            ));
        }

        Ok(Self { root })
    }

    /// Árbol completo, tal y como se cargó al arrancar.
    pub fn root(&self) -> &TaxonomyNode {
        &self.root
    }

    /// Representación JSON con sangrado que se incrusta en el prompt
    /// de grounding.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(&self.root)
            .unwrap_or_else(|_| "{}".to_string())
    }
}
