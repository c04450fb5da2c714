// [libs/domain/models/src/request.rs]
/*!
 * =================================================================
 * APARATO: REQUEST DOMAIN MODELS (V12.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE METAS DE USUARIO SOBRE EL TEJIDO
 * =================================================================
 */

use crate::item::ItemKey;
use serde::{Deserialize, Serialize};

/// Ciclo de vida de una meta de usuario:
/// `pending -> queued -> crafting|smelting -> ready -> delivered`,
/// con salidas terminales `failed` y `cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Queued,
    Crafting,
    Smelting,
    Ready,
    Delivered,
    Failed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Cancelled)
    }
}

/// Meta de usuario que posee cero o más Jobs a lo largo de su vida.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub item: ItemKey,
    pub qty: u32,
    /// Contenedor de entrega final (None = permanece en almacenamiento).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliver_to: Option<String>,
    /// La meta se satisface por fundición, no por crafteo.
    #[serde(default)]
    pub is_smelt: bool,
    pub status: RequestStatus,
    /// Jobs poseídos por esta meta, en orden de encolado.
    #[serde(default)]
    pub job_ids: Vec<u64>,
    /// Unidades producidas confirmadas por los agentes.
    #[serde(default)]
    pub produced: u32,
    /// Unidades ya entregadas en el destino.
    #[serde(default)]
    pub delivered: u32,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
