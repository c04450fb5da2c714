// [libs/core/transfer/src/plan.rs]
/*!
 * =================================================================
 * APARATO: TRANSFER PLAN BUILDER (V16.1 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: ASIGNACIÓN CODICIOSA PURA Y RESUMEN DE RÁFAGA
 *
 * # Mathematical Proof (Quota Closure):
 * La asignación recorre la lista de orígenes ya ordenada (pila mayor
 * primero) y asigna min(restante, disponible) por tarea. Por
 * construcción Σ want_i ≤ quota y want_i ≤ available_i, y ningún par
 * (contenedor, ranura) aparece en más de una tarea.
 * =================================================================
 */

use std::collections::{BTreeMap, HashSet};
use telar_domain_models::ItemKey;

/// Pila de origen candidata entregada por el índice.
#[derive(Debug, Clone)]
pub struct SourceStack {
    pub container: String,
    pub slot: u32,
    pub key: ItemKey,
    pub available: u32,
}

/// Tarea atómica de movimiento: una llamada push del driver.
#[derive(Debug, Clone)]
pub struct TransferTask {
    pub source: String,
    pub source_slot: u32,
    pub destination: String,
    pub destination_slot: Option<u32>,
    /// Identidad de la ranura de origen (contabilidad NBT exacta).
    pub key: ItemKey,
    pub want: u32,
}

/// Resumen agregado de una ráfaga ejecutada.
#[derive(Debug, Clone, Default)]
pub struct TransferSummary {
    /// Σ transferred sobre todas las tareas del plan.
    pub moved: u64,
    /// Desglose por contenedor de origen.
    pub per_source: BTreeMap<String, u64>,
}

impl TransferSummary {
    pub(crate) fn absorb(&mut self, source: &str, transferred: u32) {
        if transferred > 0 {
            self.moved += u64::from(transferred);
            *self.per_source.entry(source.to_string()).or_insert(0) += u64::from(transferred);
        }
    }

    /// Certifica cobertura completa de la cuota solicitada.
    pub fn ensure_full(&self, requested: u64) -> Result<(), crate::errors::TransferFault> {
        if self.moved < requested {
            return Err(crate::errors::TransferFault::InsufficientStock {
                requested,
                moved: self.moved,
            });
        }
        Ok(())
    }
}

/**
 * Asignación codiciosa de una cuota sobre la lista ordenada de
 * orígenes. El motor nunca mueve ítems que no estaban en la ranura
 * al momento del plan: `want` acota la llamada push del driver.
 */
pub fn build_transfer_plan(
    sources: &[SourceStack],
    destination: &str,
    destination_slot: Option<u32>,
    quota: u32,
) -> Vec<TransferTask> {
    let mut plan = Vec::new();
    let mut remaining = quota;
    let mut claimed_slots: HashSet<(String, u32)> = HashSet::new();

    for source in sources {
        if remaining == 0 {
            break;
        }
        if source.available == 0 {
            continue;
        }
        // Una sola tarea en vuelo por (contenedor, ranura)
        if !claimed_slots.insert((source.container.clone(), source.slot)) {
            continue;
        }
        let want = remaining.min(source.available);
        plan.push(TransferTask {
            source: source.container.clone(),
            source_slot: source.slot,
            destination: destination.to_string(),
            destination_slot,
            key: source.key.clone(),
            want,
        });
        remaining -= want;
    }

    plan
}
