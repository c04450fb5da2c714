// [libs/domain/models/src/export.rs]
/*!
 * =================================================================
 * APARATO: EXPORT POLICY MODELS (V12.1 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: POLÍTICA DECLARATIVA DE BUFFERS EXTERNOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DECLARATIVE CONTRACT: Cada ExportTarget ata un contenedor a una
 *    política 'stock'/'empty' con especificaciones por ranura.
 * 2. NBT TRUTH TABLE: El predicado (base-id, modo, hash?) implementa
 *    exactamente la tabla de verdad del estrato de índice.
 * =================================================================
 */

use crate::item::ItemKey;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Modo global de un destino de exportación.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Mantener ranuras aprovisionadas desde el almacenamiento.
    Stock,
    /// Drenar contenido coincidente hacia el almacenamiento.
    Empty,
}

/// Modo de coincidencia NBT de una especificación de ranura.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NbtMode {
    /// Coincidencia por base-id, con o sin huella NBT.
    Any,
    /// Base-id igual Y ranura sin huella NBT.
    None,
    /// Base-id igual Y ranura con alguna huella NBT.
    With,
    /// Identidad completa igual (base-id + huella).
    Exact,
}

impl Default for NbtMode {
    fn default() -> Self {
        Self::Any
    }
}

/// Comodín de ítem para ranuras de vacuum total.
pub const WILDCARD_ITEM: &str = "*";

/// Especificación declarativa de una ranura o rango de ranuras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSpec {
    /// Base-id objetivo o '*' (comodín).
    pub item: String,
    /// Cantidad objetivo (stock) o residuo permitido (empty).
    #[serde(default)]
    pub qty: u32,
    /// Ranura única objetivo (excluyente con el rango).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u32>,
    /// Inicio de rango inclusivo de ranuras.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_start: Option<u32>,
    /// Fin de rango inclusivo de ranuras.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_end: Option<u32>,
    /// Modo de evaluación de la huella NBT.
    #[serde(default)]
    pub nbt_mode: NbtMode,
    /// Huella requerida cuando el modo es 'exact'.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbt_hash: Option<String>,
    /// Expulsa de la ventana todo ítem que no satisfaga el predicado.
    #[serde(default)]
    pub vacuum: bool,
}

impl SlotSpec {
    /// ¿Es la especificación un comodín total?
    pub fn is_wildcard(&self) -> bool {
        self.item == WILDCARD_ITEM
    }

    /**
     * Ventana de ranuras consideradas: ranura única, rango inclusivo,
     * o None (contenedor completo).
     */
    pub fn slot_window(&self) -> Option<RangeInclusive<u32>> {
        if let Some(single_slot) = self.slot {
            return Some(single_slot..=single_slot);
        }
        match (self.slot_start, self.slot_end) {
            (Some(range_start), Some(range_end)) => Some(range_start..=range_end),
            _ => None,
        }
    }

    /**
     * Evalúa el predicado NBT contra la identidad de una ranura.
     *
     * Tabla de verdad:
     * - `any`:   base-id igual.
     * - `none`:  base-id igual Y la ranura carece de huella.
     * - `with`:  base-id igual Y la ranura porta alguna huella.
     * - `exact`: identidad completa igual (hash requerido incluido).
     */
    pub fn admits(&self, slot_key: &ItemKey) -> bool {
        if self.is_wildcard() {
            return true;
        }
        if !slot_key.matches_base(&self.item) {
            return false;
        }
        match self.nbt_mode {
            NbtMode::Any => true,
            NbtMode::None => slot_key.nbt_hash.is_none(),
            NbtMode::With => slot_key.nbt_hash.is_some(),
            NbtMode::Exact => slot_key.nbt_hash.as_deref() == self.nbt_hash.as_deref(),
        }
    }
}

/// Contenedor gobernado por política declarativa de exportación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTarget {
    /// Nombre del contenedor gobernado.
    pub container: String,
    /// Modo global de la política.
    pub mode: TargetMode,
    /// Especificaciones por ranura; vacío en modo 'empty' significa
    /// drenaje total del contenedor.
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
}
