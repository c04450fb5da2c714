// [libs/domain/models/src/agent.rs]
/*!
 * =================================================================
 * APARATO: AGENT DOMAIN MODELS (V12.2 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE NODOS REMOTOS Y SALUD DERIVADA
 *
 * # Mathematical Proof (Health Derivation):
 * La salud es una función pura de (now - last_seen) contra dos
 * umbrales configurables. Las transiciones online -> degraded ->
 * offline ocurren exactamente en los umbrales, lo que permite
 * certificar el barrido de salud con relojes sintéticos.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Clase funcional de un agente remoto del tejido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Crafter,
    Worker,
    Aisle,
    Turtle,
}

/// Estado operativo auto-reportado por el agente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Offline,
}

/// Salud derivada del último latido observado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentHealth {
    Online,
    Degraded,
    Offline,
}

/// Registro soberano de un agente en la rejilla de vigilancia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub kind: AgentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Capacidades reclamadas. El despachador jamás envía trabajo
    /// tipado a un agente que no reclamó la capacidad.
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    pub status: AgentStatus,
    /// Marca del último latido en milisegundos unix.
    pub last_seen_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job: Option<u64>,
}

impl AgentRecord {
    /**
     * Deriva la salud del agente en un instante dado.
     *
     * @param now_ms Reloj de evaluación (inyectable en tests).
     * @param degraded_after_ms Umbral online -> degraded (30 s nominal).
     * @param offline_after_ms Umbral degraded -> offline (120 s nominal).
     */
    pub fn health_at(&self, now_ms: u64, degraded_after_ms: u64, offline_after_ms: u64) -> AgentHealth {
        let silence_age_ms = now_ms.saturating_sub(self.last_seen_ms);
        if silence_age_ms < degraded_after_ms {
            AgentHealth::Online
        } else if silence_age_ms < offline_after_ms {
            AgentHealth::Degraded
        } else {
            AgentHealth::Offline
        }
    }
}
