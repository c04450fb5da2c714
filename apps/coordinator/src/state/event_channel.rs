// [apps/coordinator/src/state/event_channel.rs]
/*!
 * =================================================================
 * APARATO: OBSERVABLE EVENT CHANNEL (V21.1 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: DIFUSIÓN EN PROCESO DE EVENTOS OBSERVABLES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PASSIVE SUBSCRIBERS: Monitor y sincronizadores de tienda son
 *    suscriptores pasivos; la pérdida de uno no afecta el reactor.
 * 2. LOCK-FREE EMISSION: Canal broadcast multi-productor; el coste
 *    de despacho es O(1) independiente del número de receptores.
 * =================================================================
 */

use telar_domain_models::AgentHealth;
use tokio::sync::broadcast;
use tracing::{error, trace};

/// Capacidad del canal de difusión interno.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Eventos observables publicados por el núcleo para suscriptores
/// en proceso.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    Purchase {
        product_code: String,
        qty: u32,
        value: f64,
        buyer: String,
    },
    Transaction {
        transaction_id: String,
        value: f64,
    },
    ProductCreate { product_code: String },
    ProductUpdate { product_code: String },
    ProductDelete { product_code: String },
    AisleStatusChange {
        aisle: String,
        health: AgentHealth,
        previous: AgentHealth,
    },
    AgentStatusChange {
        agent: String,
        health: AgentHealth,
        previous: AgentHealth,
    },
    CrafterIdle { agent: String },
    WorkerIdle { agent: String },
    CraftComplete {
        job_id: u64,
        actual_output: Option<u32>,
    },
    CraftFailed { job_id: u64, reason: String },
    HistoryUndo { entry_key: String },
    /// Resumen periódico para el renderizador pasivo del monitor.
    MonitorRefresh {
        tracked_containers: usize,
        distinct_items: usize,
        pending_jobs: usize,
        open_requests: usize,
    },
}

/// Canal de eventos observables del coordinador.
#[derive(Debug, Clone)]
pub struct EventChannel {
    internal_transmission_channel: broadcast::Sender<CoordinatorEvent>,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            internal_transmission_channel: sender,
        }
    }

    /// Genera un nuevo receptor para un suscriptor pasivo.
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.internal_transmission_channel.subscribe()
    }

    /**
     * Motor interno de despacho con auditoría de congestión.
     * Sin suscriptores el evento se descarta en silencio nominal.
     */
    pub fn publish(&self, event: CoordinatorEvent) {
        match self.internal_transmission_channel.send(event) {
            Ok(subscriber_count) => {
                if subscriber_count == 0 {
                    trace!("💤 [EVENT_CHANNEL]: Signal discarded. No active subscribers.");
                } else {
                    trace!("📡 [EVENT_CHANNEL]: Signal broadcasted to {} subscribers.", subscriber_count);
                }
            }
            Err(_) => {
                error!("💀 [EVENT_CHANNEL_FATAL]: Internal transmission channel collapsed.");
            }
        }
    }
}
