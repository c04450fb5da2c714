// [libs/domain/models/src/envelope.rs]
/*!
 * =================================================================
 * APARATO: WIRE PROTOCOL ENVELOPES (V13.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL PROTOCOLO INALÁMBRICO DEL TEJIDO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TYPED PAYLOADS: Cada tipo de mensaje del protocolo es una
 *    variante etiquetada; el discriminador viaja como 'type' y el
 *    cuerpo como 'data', paridad exacta con los agentes de campo.
 * 2. AT-LEAST-ONCE: El sobre no porta garantías de orden; los
 *    consumidores deben ser idempotentes ante redelivery.
 * =================================================================
 */

use crate::agent::AgentStatus;
use crate::item::ItemKey;
use crate::job::Job;
use serde::{Deserialize, Serialize};

/// Verbos de mando aceptados por agentes de flota (turtles/workers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandVerb {
    Build,
    Move,
    Turn,
    Refill,
    Deposit,
    GoHome,
    SetHome,
    Update,
    SetWidth,
    SetBlock,
    Stop,
}

/// Cabecera de un advert de descubrimiento de tienda.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopAdvertInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Renglón de catálogo dentro de un advert SHOPSYNC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopAdvertItem {
    pub item: ItemKey,
    pub display_name: String,
    pub price: f64,
    pub stock: u64,
}

/// Carga tipada de un sobre del protocolo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MessagePayload {
    #[serde(rename = "PING")]
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<AgentStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_job: Option<u64>,
    },
    #[serde(rename = "PONG")]
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<AgentStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_job: Option<u64>,
    },
    #[serde(rename = "STATUS")]
    Status {
        status: AgentStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_job: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stats: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    #[serde(rename = "CRAFT_REQUEST")]
    CraftRequest { job: Job },
    #[serde(rename = "CRAFT_COMPLETE")]
    CraftComplete {
        job_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actual_output: Option<u32>,
    },
    #[serde(rename = "CRAFT_FAILED")]
    CraftFailed { job_id: u64, reason: String },
    #[serde(rename = "WORK_REQUEST")]
    WorkRequest { job: Job },
    #[serde(rename = "WORK_COMPLETE")]
    WorkComplete {
        job_id: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actual_output: Option<u32>,
    },
    #[serde(rename = "WORK_FAILED")]
    WorkFailed { job_id: u64, reason: String },
    #[serde(rename = "COMMAND")]
    Command {
        command: CommandVerb,
        /// Correlación para el ciclo ACK/COMPLETE/ERROR.
        command_id: String,
        #[serde(default)]
        params: serde_json::Value,
    },
    #[serde(rename = "ACK")]
    Ack { acknowledging: String },
    #[serde(rename = "COMPLETE")]
    Complete { command: String },
    #[serde(rename = "ERROR")]
    Error { error: String },
    #[serde(rename = "AISLE-PING")]
    AislePing {
        aisle: String,
        self_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redstone: Option<bool>,
        last_seen: u64,
    },
    #[serde(rename = "AISLE-PONG")]
    AislePong {
        aisle: String,
        self_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        redstone: Option<bool>,
        last_seen: u64,
    },
    #[serde(rename = "SHOPSYNC")]
    ShopSync {
        info: ShopAdvertInfo,
        items: Vec<ShopAdvertItem>,
    },
}

impl MessagePayload {
    /// Discriminador textual del protocolo (clave de registro de handlers).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping { .. } => "PING",
            Self::Pong { .. } => "PONG",
            Self::Status { .. } => "STATUS",
            Self::CraftRequest { .. } => "CRAFT_REQUEST",
            Self::CraftComplete { .. } => "CRAFT_COMPLETE",
            Self::CraftFailed { .. } => "CRAFT_FAILED",
            Self::WorkRequest { .. } => "WORK_REQUEST",
            Self::WorkComplete { .. } => "WORK_COMPLETE",
            Self::WorkFailed { .. } => "WORK_FAILED",
            Self::Command { .. } => "COMMAND",
            Self::Ack { .. } => "ACK",
            Self::Complete { .. } => "COMPLETE",
            Self::Error { .. } => "ERROR",
            Self::AislePing { .. } => "AISLE-PING",
            Self::AislePong { .. } => "AISLE-PONG",
            Self::ShopSync { .. } => "SHOPSYNC",
        }
    }
}

/// Sobre soberano del bus inalámbrico.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_label: Option<String>,
    /// Destinatario exclusivo; None difunde a todos los oyentes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub timestamp_ms: u64,
    pub payload: MessagePayload,
}

impl Envelope {
    /// ¿Debe un oyente con la identidad dada procesar este sobre?
    pub fn is_addressed_to(&self, listener_id: &str) -> bool {
        match &self.target_id {
            Some(exclusive_target) => exclusive_target == listener_id,
            None => true,
        }
    }
}
