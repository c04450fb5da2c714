// [libs/domain/models/src/job.rs]
/*!
 * =================================================================
 * APARATO: JOB DOMAIN MODELS (V12.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE UNIDADES ATÓMICAS DE CRAFTEO
 *
 * # Mathematical Proof (Materials Reservation):
 * El multiset 'materials' es exactamente inputs-por-craft × crafts,
 * congelado en la creación del Job. La reserva se descuenta del stock
 * proyectado del planificador, nunca del stock autoritativo.
 * =================================================================
 */

use crate::item::ItemKey;
use crate::recipe::{Recipe, RecipeInput};
use serde::{Deserialize, Serialize};

/// Máquina de estados de un Job.
/// `pending -> assigned -> crafting -> (completed | failed)`;
/// `cancelled` solo es alcanzable desde `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Assigned,
    Crafting,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// ¿Es un estado terminal (archivable en el anillo de historia)?
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Unidad atómica de trabajo de crafteo despachada a un único agente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Identificador monotónico, persistente entre reinicios.
    pub id: u64,
    /// Identidad del ítem producido.
    pub output: ItemKey,
    /// Cantidad objetivo de salida.
    pub qty: u32,
    /// Invocaciones de receta necesarias (ceil(qty / salida-por-craft)).
    pub crafts: u32,
    /// Receta congelada en el momento de la creación.
    pub recipe: Recipe,
    /// Multiset exacto de insumos reservados (inputs × crafts).
    pub materials: Vec<RecipeInput>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Salida real reportada por el agente al completar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<u32>,
    /// Justificación técnica del fallo terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Renglón estructurado de la lista de insumos faltantes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingMaterial {
    pub item: ItemKey,
    pub needed: u64,
    pub have: u64,
}
