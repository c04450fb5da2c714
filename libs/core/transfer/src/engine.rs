// [libs/core/transfer/src/engine.rs]
/*!
 * =================================================================
 * APARATO: TRANSFER EXECUTION ENGINE (V16.3 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: EJECUCIÓN PARALELA ACOTADA CON ÉXITO PARCIAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CANONICAL LOCK PATTERN: Plan bajo cerrojo, liberación, ráfaga
 *    de I/O paralela, re-adquisición para aplicar cada delta en el
 *    orden en que su tarea completa. Ningún guard cruza un punto de
 *    suspensión.
 * 2. PARTIAL SUCCESS: El retorno del driver es el conteo
 *    autoritativo; Unavailable/Blocked rinden 0 transferido y el
 *    plan NO se reintenta — el siguiente tick re-planifica con
 *    estado fresco.
 * 3. EXPORT GUARD: El motor se niega a empujar hacia buffers de
 *    exportación no gobernados por una política configurada.
 *
 * # Mathematical Proof (Bounded Stall):
 * Cada llamada del driver está acotada por un timeout; una llamada
 * colgada consume a lo sumo una ranura de la ráfaga (ancho 8) y
 * jamás detiene los demás ticks del planificador.
 * =================================================================
 */

use crate::errors::TransferFault;
use crate::plan::{build_transfer_plan, SourceStack, TransferSummary, TransferTask};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use telar_core_index::InventoryIndex;
use telar_domain_models::{ContainerRole, ItemKey, NbtMode, SlotSpec};
use telar_infra_driver::FabricDriver;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Ancho nominal de las ráfagas paralelas.
const NOMINAL_BATCH_WIDTH: usize = 8;

/// Cota superior de una llamada individual del driver.
const DRIVER_CALL_TIMEOUT_SECONDS: u64 = 10;

/// Alternativas de destino probadas por ranura en drenajes a storage.
const DRAIN_TARGET_ATTEMPT_LIMIT: usize = 4;

/// Motor de transferencias del tejido.
pub struct TransferEngine {
    driver: Arc<dyn FabricDriver>,
    /// Contenedores gobernados por políticas de exportación.
    export_destinations: HashSet<String>,
    batch_width: usize,
    call_timeout: Duration,
}

impl TransferEngine {
    pub fn new(driver: Arc<dyn FabricDriver>, export_destinations: HashSet<String>) -> Self {
        Self {
            driver,
            export_destinations,
            batch_width: NOMINAL_BATCH_WIDTH,
            call_timeout: Duration::from_secs(DRIVER_CALL_TIMEOUT_SECONDS),
        }
    }

    /// Ajusta el ancho de ráfaga (Proving Grounds y sitios estrechos).
    pub fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.batch_width = batch_width.max(1);
        self
    }

    // --- ESTRATO DE EJECUCIÓN DE PLANES ---

    /**
     * Ejecuta un plan de push en ráfagas paralelas acotadas.
     *
     * # Errors:
     * - `ForbiddenDestination`: el destino es un buffer de exportación
     *   sin política configurada. Los fallos del driver NUNCA abortan
     *   la ráfaga: rinden 0 y se registran en el rastro.
     */
    pub async fn execute_plan(
        &self,
        index: &RwLock<InventoryIndex>,
        plan: Vec<TransferTask>,
    ) -> Result<TransferSummary, TransferFault> {
        let mut summary = TransferSummary::default();
        if plan.is_empty() {
            return Ok(summary);
        }

        // 1. GUARDIA DE DESTINO (política de exportación)
        {
            let index_guard = index.read().expect("LOCK_POISONED: Inventory index");
            for task in &plan {
                let destination_role = index_guard.role_of(&task.destination);
                if destination_role == Some(ContainerRole::ExportBuffer)
                    && !self.export_destinations.contains(&task.destination)
                {
                    return Err(TransferFault::ForbiddenDestination {
                        container: task.destination.clone(),
                    });
                }
            }
        }

        // 2. ANCHO EFECTIVO: destino fijado degrada a secuencial
        // (semántica de periférico: una ranura concreta serializa).
        let pinned_destination = plan.iter().any(|task| task.destination_slot.is_some());
        let effective_width = if pinned_destination { 1 } else { self.batch_width };

        // 3. RÁFAGA PARALELA ACOTADA CON DELTAS EN ORDEN DE COMPLETITUD
        // Los deltas se aplican al índice en el orden en que cada tarea
        // RESUELVE, no en el orden del plan; las invariantes se
        // sostienen puntualmente tras cada delta individual.
        let mut resolution_stream = stream::iter(plan.into_iter().map(|task| async move {
            let transferred = self.fire_push_task(&task).await;
            (task, transferred)
        }))
        .buffer_unordered(effective_width);

        while let Some((task, transferred)) = resolution_stream.next().await {
            if transferred > 0 {
                let mut index_guard = index.write().expect("LOCK_POISONED: Inventory index");
                index_guard.record_transfer(
                    &task.source,
                    task.source_slot,
                    &task.destination,
                    task.destination_slot,
                    &task.key,
                    transferred,
                );
                summary.absorb(&task.source, transferred);
            }
        }

        Ok(summary)
    }

    /// Dispara una tarea push individual bajo timeout acotado.
    async fn fire_push_task(&self, task: &TransferTask) -> u32 {
        let driver_call = self.driver.push(
            &task.source,
            task.source_slot,
            &task.destination,
            task.want,
            task.destination_slot,
        );

        match timeout(self.call_timeout, driver_call).await {
            Ok(Ok(transferred)) => transferred,
            Ok(Err(driver_fault)) => {
                debug!("💤 [TRANSFER_SKIP]: Task [{}:{}] -> [{}] yielded 0: {}",
                    task.source, task.source_slot, task.destination, driver_fault);
                0
            }
            Err(_) => {
                warn!("⏱️ [TRANSFER_TIMEOUT]: Driver call on [{}:{}] exceeded bound. Treating as unavailable.",
                    task.source, task.source_slot);
                0
            }
        }
    }

    // --- ESTRATO DE OPERACIONES DE CONVENIENCIA ---

    /**
     * Extrae `amount` unidades de una identidad exacta desde el
     * almacenamiento hacia un destino. Retorna el resumen parcial.
     */
    pub async fn withdraw(
        &self,
        index: &RwLock<InventoryIndex>,
        key: &ItemKey,
        amount: u32,
        destination: &str,
        destination_slot: Option<u32>,
    ) -> Result<TransferSummary, TransferFault> {
        let plan = {
            let index_guard = index.read().expect("LOCK_POISONED: Inventory index");
            let sources: Vec<SourceStack> = index_guard
                .find_item(key, true)
                .into_iter()
                .map(|location| SourceStack {
                    container: location.container,
                    slot: location.slot,
                    key: key.clone(),
                    available: location.count,
                })
                .collect();
            build_transfer_plan(&sources, destination, destination_slot, amount)
        };

        self.execute_plan(index, plan).await
    }

    /**
     * Extrae unidades de cualquier variante admitida por una
     * especificación NBT (camino del motor de exportación).
     */
    pub async fn withdraw_matching(
        &self,
        index: &RwLock<InventoryIndex>,
        spec: &SlotSpec,
        amount: u32,
        destination: &str,
        destination_slot: Option<u32>,
    ) -> Result<TransferSummary, TransferFault> {
        let plan = {
            let index_guard = index.read().expect("LOCK_POISONED: Inventory index");
            let sources: Vec<SourceStack> = match (spec.nbt_mode, spec.nbt_hash.as_deref()) {
                // Identidad completa conocida: camino exacto directo
                (NbtMode::Exact, Some(exact_hash)) => {
                    let exact_key = ItemKey::with_hash(spec.item.clone(), exact_hash);
                    index_guard
                        .find_item(&exact_key, true)
                        .into_iter()
                        .map(|location| SourceStack {
                            container: location.container,
                            slot: location.slot,
                            key: exact_key.clone(),
                            available: location.count,
                        })
                        .collect()
                }
                _ => index_guard
                    .find_by_base_id(&spec.item, true)
                    .into_iter()
                    .filter(|(key, _)| spec.admits(key))
                    .map(|(key, location)| SourceStack {
                        container: location.container,
                        slot: location.slot,
                        key,
                        available: location.count,
                    })
                    .collect(),
            };
            build_transfer_plan(&sources, destination, destination_slot, amount)
        };

        self.execute_plan(index, plan).await
    }

    /**
     * Drena `amount` unidades de una ranura concreta hacia el
     * almacenamiento, probando hasta 4 destinos alternativos
     * (contenedores con ranuras libres conocidas primero).
     */
    pub async fn pull_to_storage(
        &self,
        index: &RwLock<InventoryIndex>,
        source: &str,
        source_slot: u32,
        key: &ItemKey,
        amount: u32,
    ) -> u64 {
        let drain_candidates: Vec<String> = {
            let index_guard = index.read().expect("LOCK_POISONED: Inventory index");
            index_guard
                .storage_drain_targets()
                .into_iter()
                .filter(|(name, _)| name != source)
                .take(DRAIN_TARGET_ATTEMPT_LIMIT)
                .map(|(name, _)| name)
                .collect()
        };

        let mut total_moved = 0u64;
        let mut remaining = amount;

        for drain_target in drain_candidates {
            if remaining == 0 {
                break;
            }
            let driver_call = self
                .driver
                .pull(&drain_target, source, source_slot, remaining, None);

            let transferred = match timeout(self.call_timeout, driver_call).await {
                Ok(Ok(transferred)) => transferred,
                Ok(Err(driver_fault)) => {
                    debug!("💤 [DRAIN_SKIP]: Pull [{}:{}] -> [{}] yielded 0: {}",
                        source, source_slot, drain_target, driver_fault);
                    0
                }
                Err(_) => {
                    warn!("⏱️ [DRAIN_TIMEOUT]: Pull on [{}:{}] exceeded bound.", source, source_slot);
                    0
                }
            };

            if transferred > 0 {
                let mut index_guard = index.write().expect("LOCK_POISONED: Inventory index");
                index_guard.record_transfer(source, source_slot, &drain_target, None, key, transferred);
                total_moved += u64::from(transferred);
                remaining -= transferred.min(remaining);
            }
        }

        total_moved
    }

    /**
     * Deposita el contenido de un contenedor en el almacenamiento.
     * Con `key_filter` solo se drenan las ranuras de esa identidad.
     */
    pub async fn deposit(
        &self,
        index: &RwLock<InventoryIndex>,
        from_container: &str,
        key_filter: Option<&ItemKey>,
    ) -> u64 {
        let drain_list: Vec<(u32, ItemKey, u32)> = {
            let index_guard = index.read().expect("LOCK_POISONED: Inventory index");
            match index_guard.container(from_container) {
                Some(entry) => entry
                    .slots
                    .iter()
                    .filter(|(_, slot_item)| {
                        key_filter
                            .map(|filter_key| slot_item.key == *filter_key)
                            .unwrap_or(true)
                    })
                    .map(|(slot, slot_item)| (*slot, slot_item.key.clone(), slot_item.count))
                    .collect(),
                None => Vec::new(),
            }
        };

        let mut total_moved = 0u64;
        for (slot, key, count) in drain_list {
            total_moved += self
                .pull_to_storage(index, from_container, slot, &key, count)
                .await;
        }
        total_moved
    }
}
