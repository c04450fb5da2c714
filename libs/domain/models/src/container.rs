// [libs/domain/models/src/container.rs]
/*!
 * =================================================================
 * APARATO: CONTAINER & SLOT MODELS (V12.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS DE CONTENEDORES EXTERNOS Y SUS RANURAS
 * =================================================================
 */

use crate::item::ItemKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rol semántico de un contenedor. La política de transferencia del
/// motor depende de este rol (los push hacia buffers de exportación
/// exigen un ExportTarget configurado).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerRole {
    /// Almacenamiento general: origen y destino por defecto.
    Storage,
    /// Buffer externo gobernado por una política declarativa.
    ExportBuffer,
    /// Horno u homólogo con ranuras de entrada/combustible/salida.
    Furnace,
    /// Bandeja de entrada de un agente remoto (pasillo, crafter).
    AgentInbox,
    /// Manipulador de introspección; nunca es destino de drenaje.
    Manipulator,
}

/// Contenido observado de una ranura: identidad, conteo y blob de
/// detalle opaco cacheado en la primera observación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotItem {
    pub key: ItemKey,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Mapa disperso ranura -> contenido. BTreeMap garantiza iteración
/// determinista en la construcción de planes.
pub type SlotMap = BTreeMap<u32, SlotItem>;

/// Instantánea completa de un contenedor producida por un scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub name: String,
    pub size: u32,
    pub slots: SlotMap,
}

/// Resultado enriquecido de `detail(slot)` del driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDetail {
    pub key: ItemKey,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Campos opacos del runtime anfitrión; el núcleo jamás los interpreta.
    #[serde(default)]
    pub opaque_fields: serde_json::Value,
}
