// [apps/coordinator/src/state/command_tracker.rs]
/*!
 * =================================================================
 * APARATO: COMMAND LIFECYCLE TRACKER (V21.1 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: CORRELACIÓN ACK/COMPLETE/ERROR DE MANDOS DE FLOTA
 *
 * # Logic:
 * Cada COMMAND emitido registra un canal de resolución de un solo
 * uso bajo su command_id. Los handlers del bus resuelven el canal
 * al llegar ACK o ERROR; la ausencia dentro del plazo se interpreta
 * como agente fuera de línea.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Veredicto de la fase de reconocimiento de un mando.
pub type CommandVerdict = Result<(), String>;

/// Rastreador de mandos en vuelo hacia agentes de flota.
#[derive(Default)]
pub struct CommandTracker {
    pending_acknowledgements: Mutex<HashMap<String, oneshot::Sender<CommandVerdict>>>,
}

impl CommandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un mando en vuelo y entrega su canal de resolución.
    pub fn register(&self, command_id: &str) -> oneshot::Receiver<CommandVerdict> {
        let (resolution_sender, resolution_receiver) = oneshot::channel();
        let mut pending_guard = self
            .pending_acknowledgements
            .lock()
            .expect("LOCK_POISONED: Command tracker");
        pending_guard.insert(command_id.to_string(), resolution_sender);
        resolution_receiver
    }

    /// Resuelve un mando reconocido por el agente.
    pub fn resolve_ack(&self, command_id: &str) {
        if let Some(resolution_sender) = self.take(command_id) {
            debug!("🤝 [COMMAND_ACK]: Command {} acknowledged.", command_id);
            let _ = resolution_sender.send(Ok(()));
        }
    }

    /// Resuelve un mando rechazado con el error reportado.
    pub fn resolve_error(&self, command_id: &str, error: &str) {
        if let Some(resolution_sender) = self.take(command_id) {
            let _ = resolution_sender.send(Err(error.to_string()));
        }
    }

    /// Descarta un mando expirado sin resolución.
    pub fn discard(&self, command_id: &str) {
        let _ = self.take(command_id);
    }

    fn take(&self, command_id: &str) -> Option<oneshot::Sender<CommandVerdict>> {
        let mut pending_guard = self
            .pending_acknowledgements
            .lock()
            .expect("LOCK_POISONED: Command tracker");
        pending_guard.remove(command_id)
    }
}
