// [libs/domain/models/src/shop.rs]
/*!
 * =================================================================
 * APARATO: SHOP DOMAIN MODELS (V12.3 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CATÁLOGO, TRANSACCIONES Y METADATOS DE COMPRA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE GATEWAY: La pasarela de criptomoneda es una fuente opaca;
 *    aquí solo viven los registros que cruzan su frontera.
 * 2. METADATA GRAMMAR: 'key=value; ...; bareValue; ...' — los valores
 *    sueltos se cotejan contra el catálogo, las claves de operador
 *    ('message', 'error') activan la cuarentena anti-bucle.
 * =================================================================
 */

use crate::item::ItemKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Producto del catálogo de la tienda.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Código de compra cotejado contra los bareValues del metadato.
    pub code: String,
    pub display_name: String,
    pub item: ItemKey,
    /// Precio unitario en la moneda de la pasarela.
    pub price: f64,
    /// Identidad del agente de pasillo que dispensa este producto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
}

/// Registro crudo recibido del flujo de transacciones externo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub from: String,
    pub to: String,
    pub value: f64,
    #[serde(default)]
    pub metadata: String,
}

/// Claves de operador que fuerzan cuarentena en lugar de auto-reembolso.
const OPERATOR_METADATA_KEYS: [&str; 2] = ["message", "error"];

/// Metadato de transacción descompuesto en pares y valores sueltos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub pairs: BTreeMap<String, String>,
    pub bare_values: Vec<String>,
}

impl TransactionMetadata {
    /**
     * Descompone la gramática 'key=value; ...; bareValue; ...'.
     * Segmentos vacíos se descartan; los espacios perimetrales se podan.
     */
    pub fn parse(raw_metadata: &str) -> Self {
        let mut decomposed = Self::default();
        for raw_segment in raw_metadata.split(';') {
            let segment = raw_segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                Some((key, value)) => {
                    decomposed
                        .pairs
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                None => decomposed.bare_values.push(segment.to_string()),
            }
        }
        decomposed
    }

    /// ¿Porta claves de operador que exigen reembolso manual/diferido?
    pub fn carries_operator_keys(&self) -> bool {
        OPERATOR_METADATA_KEYS
            .iter()
            .any(|operator_key| self.pairs.contains_key(*operator_key))
    }
}
