// [libs/infra/bus/src/bus.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN MESSAGE BUS (V18.4 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SOBRES TIPADOS, FILTRADO Y BOMBA DE HANDLERS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SYNCHRONOUS DISPATCH: Los handlers registrados se invocan de
 *    forma síncrona dentro del bucle de recepción; corren hasta
 *    completarse antes de la siguiente trama.
 * 2. TARGET FILTERING: Los sobres con target ajeno se descartan en
 *    silencio; los propios ecos de difusión también.
 * 3. PROTOCOL TOLERANCE: Una trama indescifrable se registra como
 *    ProtocolError y la bomba continúa; jamás colapsa el proceso.
 * =================================================================
 */

use crate::errors::BusFault;
use crate::link::BusLink;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use telar_domain_models::{Envelope, MessagePayload};
use tracing::{debug, trace, warn};

/// Handler síncrono registrado para un tipo de mensaje.
pub type BusHandler = Box<dyn Fn(&Envelope) + Send + Sync>;

/// Bus de mensajes soberano del tejido.
pub struct MessageBus {
    self_id: String,
    self_label: Option<String>,
    link: Arc<dyn BusLink>,
    handlers: RwLock<HashMap<String, Vec<BusHandler>>>,
}

impl MessageBus {
    pub fn new(self_id: impl Into<String>, self_label: Option<String>, link: Arc<dyn BusLink>) -> Self {
        Self {
            self_id: self_id.into(),
            self_label,
            link,
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    // --- ESTRATO DE EMISIÓN ---

    /// Emite un sobre dirigido a un destinatario exclusivo.
    pub async fn send(&self, payload: MessagePayload, target_id: &str) -> Result<(), BusFault> {
        self.emit(payload, Some(target_id.to_string())).await
    }

    /// Difunde un sobre a todos los oyentes del canal.
    pub async fn broadcast(&self, payload: MessagePayload) -> Result<(), BusFault> {
        self.emit(payload, None).await
    }

    async fn emit(&self, payload: MessagePayload, target_id: Option<String>) -> Result<(), BusFault> {
        let envelope = Envelope {
            sender_id: self.self_id.clone(),
            sender_label: self.self_label.clone(),
            target_id,
            timestamp_ms: chrono::Utc::now().timestamp_millis().max(0) as u64,
            payload,
        };

        // Codificación con nombres de campo: el esquema sobrevive a
        // reordenamientos de struct entre versiones de agente.
        let frame = rmp_serde::to_vec_named(&envelope)?;
        trace!("📤 [BUS_TX]: {} -> {:?} ({} octets).",
            envelope.payload.kind(), envelope.target_id, frame.len());

        self.link.transmit(&frame).await
    }

    // --- ESTRATO DE REGISTRO DE HANDLERS ---

    /// Registra un handler síncrono para un tipo de mensaje.
    pub fn on(&self, message_kind: &str, handler: impl Fn(&Envelope) + Send + Sync + 'static) {
        let mut handlers_guard = self.handlers.write().expect("LOCK_POISONED: Bus handlers");
        handlers_guard
            .entry(message_kind.to_string())
            .or_default()
            .push(Box::new(handler));
    }

    // --- ESTRATO DE RECEPCIÓN ---

    /**
     * Recibe el siguiente sobre dirigido a este nodo.
     *
     * Con `wait_bound` el ciclo es cancelable por temporizador y
     * retorna None al expirar. Tramas corruptas y sobres ajenos se
     * descartan sin consumir el presupuesto de espera lógico.
     */
    pub async fn receive(&self, wait_bound: Option<Duration>) -> Result<Option<Envelope>, BusFault> {
        match wait_bound {
            Some(bound) => match tokio::time::timeout(bound, self.receive_inner()).await {
                Ok(received) => received.map(Some),
                Err(_) => Ok(None),
            },
            None => self.receive_inner().await.map(Some),
        }
    }

    async fn receive_inner(&self) -> Result<Envelope, BusFault> {
        loop {
            let frame = self.link.receive_frame().await?;

            let envelope: Envelope = match rmp_serde::from_slice(&frame) {
                Ok(envelope) => envelope,
                Err(decode_fault) => {
                    warn!("🧾 [PROTOCOL_ERROR]: Undecodable frame ({} octets): {}",
                        frame.len(), decode_fault);
                    continue;
                }
            };

            // Filtrado: ecos propios y sobres con destinatario ajeno
            if envelope.sender_id == self.self_id {
                continue;
            }
            if !envelope.is_addressed_to(&self.self_id) {
                trace!("💤 [BUS_SKIP]: Envelope for {:?} ignored.", envelope.target_id);
                continue;
            }

            return Ok(envelope);
        }
    }

    /**
     * Bomba de una iteración: recibe y despacha a los handlers
     * registrados. Retorna el tipo despachado (None si expiró).
     */
    pub async fn pump_once(&self, wait_bound: Option<Duration>) -> Result<Option<String>, BusFault> {
        match self.receive(wait_bound).await? {
            Some(envelope) => {
                let kind = envelope.payload.kind().to_string();
                self.dispatch(&envelope);
                Ok(Some(kind))
            }
            None => Ok(None),
        }
    }

    /// Bucle perpetuo de la bomba entrante (daemon del coordinador).
    pub async fn run_pump(&self) -> Result<(), BusFault> {
        loop {
            let envelope = self.receive_inner().await?;
            self.dispatch(&envelope);
        }
    }

    fn dispatch(&self, envelope: &Envelope) {
        let handlers_guard = self.handlers.read().expect("LOCK_POISONED: Bus handlers");
        match handlers_guard.get(envelope.payload.kind()) {
            Some(registered) => {
                debug!("📥 [BUS_RX]: {} from [{}] -> {} handler(s).",
                    envelope.payload.kind(), envelope.sender_id, registered.len());
                for handler in registered {
                    handler(envelope);
                }
            }
            None => {
                trace!("💤 [BUS_RX]: {} from [{}] with no registered handler.",
                    envelope.payload.kind(), envelope.sender_id);
            }
        }
    }
}
