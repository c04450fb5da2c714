// [libs/core/planner/src/planner.rs]
/*!
 * =================================================================
 * APARATO: RECURSIVE MATERIALS PLANNER (V17.4 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: DESCOMPOSICIÓN RECURSIVA DE METAS EN SUB-JOBS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PROJECTED STOCK: El planificador muta una COPIA del stock
 *    (débito de reservas, crédito optimista de salidas esperadas)
 *    para que los ítems dependientes planifiquen contra inventario
 *    proyectado sin doble conteo. El stock autoritativo solo muta
 *    por deltas de transferencia y scans.
 * 2. CYCLE DISCIPLINE: El conjunto 'visited' es por meta y se limpia
 *    en el retorno exitoso, permitiendo recraftear el mismo ítem en
 *    nodos hermanos.
 * 3. SILENT RETRY: Si la cola aún no puede reservar (sub-jobs en
 *    vuelo), se retornan los ids acumulados sin error; el ciclo de
 *    progreso reintenta en ticks posteriores.
 *
 * # Mathematical Proof (Termination):
 * La profundidad está acotada por MAX_DEPTH y cada descenso agrega
 * el ítem actual a 'visited'; un grafo finito sin ciclos de
 * profundidad <= MAX_DEPTH termina siempre, y todo ciclo se reporta
 * como CycleDetected sin encolar jobs.
 * =================================================================
 */

use crate::errors::{PlanFault, QueueFault};
use crate::queue::JobQueue;
use std::collections::{BTreeSet, HashMap};
use telar_domain_models::{ItemKey, RecipeBook};
use tracing::{debug, info};

/// Profundidad máxima nominal de la cadena de sub-recetas.
const NOMINAL_MAX_PLAN_DEPTH: u32 = 10;

/// Resultado de una pasada de planificación.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    /// Jobs encolados por esta pasada (orden de dependencia).
    pub job_ids: Vec<u64>,
    /// Déficits delegados al orquestador de fundición:
    /// el ítem carece de receta de crafteo pero es fundible.
    pub smelt_needs: Vec<(ItemKey, u32)>,
    /// La reserva raíz quedó pendiente (sub-jobs en vuelo).
    pub awaiting_materials: bool,
}

/// Planificador recursivo de materiales.
pub struct RequestPlanner {
    max_depth: u32,
}

impl Default for RequestPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestPlanner {
    pub fn new() -> Self {
        Self {
            max_depth: NOMINAL_MAX_PLAN_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /**
     * Descompone la meta (item, qty) contra el stock proyectado y
     * encola los sub-jobs necesarios en orden de dependencia.
     *
     * El planificador es idempotente bajo reintento dado un snapshot
     * de stock estable.
     *
     * # Errors:
     * - `MaxDepthExceeded`: cadena de sub-recetas más profunda que el límite.
     * - `CycleDetected`: el grafo de recetas se muerde la cola.
     * - `NoRecipe`: sin definición de crafteo ni de fundición.
     */
    pub fn queue_recursive(
        &self,
        queue: &mut JobQueue,
        recipes: &RecipeBook,
        stock: &mut HashMap<ItemKey, u64>,
        item: &ItemKey,
        qty: u32,
        request_id: u64,
        depth: u32,
        visited: &mut BTreeSet<String>,
        now_ms: u64,
    ) -> Result<PlanOutcome, PlanFault> {
        // 1. GUARDIA DE PROFUNDIDAD
        if depth > self.max_depth {
            return Err(PlanFault::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }

        // 2. GUARDIA DE CICLOS
        if visited.contains(&item.base_id) {
            return Err(PlanFault::CycleDetected { item: item.clone() });
        }

        let mut outcome = PlanOutcome::default();

        // 3. DÉFICIT CONTRA STOCK PROYECTADO
        let have = stock.get(item).copied().unwrap_or(0);
        let need = u64::from(qty).saturating_sub(have);
        if need == 0 {
            return Ok(outcome);
        }
        let need = need.min(u64::from(u32::MAX)) as u32;

        // 4. RESOLUCIÓN DE RECETA (crafteo o delegación a fundición)
        let recipe = match recipes.craft_recipe(&item.base_id) {
            Some(recipe) => recipe.clone(),
            None => {
                if recipes.is_smeltable(&item.base_id) {
                    debug!("🔥 [PLANNER_SMELT]: [{}] x{} delegated to smelting strata (request {}).",
                        item, need, request_id);
                    outcome.smelt_needs.push((item.clone(), need));
                    return Ok(outcome);
                }
                return Err(PlanFault::NoRecipe { item: item.clone() });
            }
        };

        // 5. VOLUMEN DE INVOCACIONES
        let crafts = need.div_ceil(recipe.output_count.max(1));

        // 6. DESCENSO RECURSIVO POR INSUMOS CORTOS
        visited.insert(item.base_id.clone());

        for input in &recipe.inputs {
            let required_total = input.count * crafts;
            let input_have = stock.get(&input.item).copied().unwrap_or(0);
            if u64::from(required_total) <= input_have {
                continue;
            }

            let sub_outcome = self.queue_recursive(
                queue,
                recipes,
                stock,
                &input.item,
                required_total,
                request_id,
                depth + 1,
                visited,
                now_ms,
            )?;

            outcome.job_ids.extend(sub_outcome.job_ids);
            outcome.smelt_needs.extend(sub_outcome.smelt_needs);
            outcome.awaiting_materials |= sub_outcome.awaiting_materials;
        }

        // 7. RESERVA RAÍZ Y PROYECCIÓN OPTIMISTA
        match queue.add(item.clone(), need, stock, recipes, now_ms) {
            Ok(job) => {
                // Débito de insumos reservados sobre el stock proyectado
                for material in &job.materials {
                    let entry = stock.entry(material.item.clone()).or_insert(0);
                    *entry = entry.saturating_sub(u64::from(material.count));
                }
                // Crédito optimista de la salida esperada
                let expected_output = u64::from(job.crafts) * u64::from(job.recipe.output_count);
                *stock.entry(item.clone()).or_insert(0) += expected_output;

                info!("🧮 [PLANNER_RESERVE]: Job {} planned for request {} ([{}] x{}).",
                    job.id, request_id, item, need);
                outcome.job_ids.push(job.id);
            }
            // 8. Sub-jobs en vuelo: sin error, el caller reintenta
            Err(QueueFault::MissingMaterials { missing }) => {
                debug!("⏳ [PLANNER_WAIT]: Reservation for [{}] deferred ({} inputs in flight).",
                    item, missing.len());
                outcome.awaiting_materials = true;
            }
            Err(QueueFault::NoRecipe { item: orphan_item }) => {
                visited.remove(&orphan_item.base_id);
                return Err(PlanFault::NoRecipe { item: orphan_item });
            }
            Err(unexpected_fault) => {
                debug!("⚠️ [PLANNER_ANOMALY]: Queue rejected reservation: {}", unexpected_fault);
                outcome.awaiting_materials = true;
            }
        }

        // Limpieza del rastro en el retorno exitoso (nodos hermanos
        // pueden volver a craftear este ítem).
        visited.remove(&item.base_id);

        Ok(outcome)
    }
}
