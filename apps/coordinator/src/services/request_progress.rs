// [apps/coordinator/src/services/request_progress.rs]
/*!
 * =================================================================
 * APARATO: REQUEST PROGRESS LOOP (V21.8 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: AVANCE DE METAS — PLANIFICACIÓN, ENTREGA, LIMPIEZA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RETRY IDEMPOTENCE: Antes de re-planificar, el stock proyectado
 *    se ajusta con los jobs en vuelo de la meta (débito de insumos
 *    reservados, crédito de salidas esperadas); el reintento jamás
 *    duplica sub-jobs.
 * 2. FAILURE TRIAGE: MissingMaterials espera (estado pending),
 *    Cycle/MaxDepth fallan terminalmente, NoRecipe falla salvo que
 *    el ítem sea fundible (delegación a la pizarra de fundición).
 * 3. DURABILITY PULSE: Cada pase persiste cola, metas e historia en
 *    sus stores con escrituras coalescidas.
 * =================================================================
 */

use crate::state::AppState;
use std::collections::BTreeSet;
use std::time::Duration;
use telar_core_planner::PlanFault;
use telar_domain_models::{Request, RequestStatus};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Inicia el bucle de progreso de metas.
pub async fn spawn_request_progress(application_state: AppState) {
    let mut progress_ticker = interval(Duration::from_secs(
        application_state.config.intervals.progress_secs,
    ));
    progress_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🎯 [REQUEST_LOOP]: Goal progress daemon active.");
        loop {
            progress_ticker.tick().await;
            if let Err(progress_fault) = execute_progress_pass(&application_state).await {
                error!("❌ [REQUEST_FAULT]: Progress pass collapsed: {}", progress_fault);
            }
        }
    });
}

/// Un pase completo de avance sobre todas las metas abiertas.
pub async fn execute_progress_pass(application_state: &AppState) -> anyhow::Result<()> {
    let now_ms = application_state.now_ms();

    let open_requests = {
        let ledger_guard = application_state
            .ledger
            .lock()
            .expect("LOCK_POISONED: Request ledger");
        ledger_guard.open_requests()
    };

    for request in open_requests {
        match request.status {
            RequestStatus::Pending => plan_request(application_state, &request),
            RequestStatus::Smelting => check_smelt_coverage(application_state, &request),
            RequestStatus::Ready => deliver_request(application_state, &request).await,
            // queued avanza a crafting cuando la bomba observa el primer
            // job en curso; crafting avanza por CRAFT_COMPLETE
            _ => {}
        }
    }

    // Limpieza de metas terminales caducas
    {
        let mut ledger_guard = application_state
            .ledger
            .lock()
            .expect("LOCK_POISONED: Request ledger");
        let purged = ledger_guard.cleanup(now_ms);
        if purged > 0 {
            debug!("🗑️ [REQUEST_CLEANUP]: Purged {} expired goals.", purged);
        }
    }

    // Pulso de durabilidad coalescida
    if let Err(persist_fault) = application_state.persist_durable_state() {
        warn!("💾 [REQUEST_PERSIST]: Durable pulse failed: {}", persist_fault);
    }

    Ok(())
}

/**
 * Planifica (o re-planifica) una meta pendiente contra el stock
 * proyectado, ajustado por los jobs de la meta aún en vuelo.
 */
fn plan_request(application_state: &AppState, request: &Request) {
    let now_ms = application_state.now_ms();

    // 1. STOCK PROYECTADO: copia del autoritativo
    let mut projected_stock = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.stock_snapshot()
    };

    let mut queue_guard = application_state
        .queue
        .lock()
        .expect("LOCK_POISONED: Job queue");

    // 2. AJUSTE POR JOBS EN VUELO DE ESTA META (idempotencia de reintento)
    for job_id in &request.job_ids {
        if let Some(in_flight) = queue_guard.job(*job_id) {
            for material in &in_flight.materials {
                let entry = projected_stock.entry(material.item.clone()).or_insert(0);
                *entry = entry.saturating_sub(u64::from(material.count));
            }
            let expected = u64::from(in_flight.crafts) * u64::from(in_flight.recipe.output_count);
            *projected_stock.entry(in_flight.output.clone()).or_insert(0) += expected;
        }
    }

    // 3. DESCOMPOSICIÓN RECURSIVA
    let mut visited = BTreeSet::new();
    let plan_result = application_state.planner.queue_recursive(
        &mut queue_guard,
        &application_state.recipes,
        &mut projected_stock,
        &request.item,
        request.qty,
        request.id,
        0,
        &mut visited,
        now_ms,
    );
    drop(queue_guard);

    let mut ledger_guard = application_state
        .ledger
        .lock()
        .expect("LOCK_POISONED: Request ledger");

    match plan_result {
        Ok(outcome) => {
            // attach_jobs promueve pending -> queued; la transición a
            // crafting la dispara la bomba cuando un agente reporta el
            // primer job físicamente en curso (STATUS busy).
            if !outcome.job_ids.is_empty() {
                ledger_guard.attach_jobs(request.id, &outcome.job_ids, now_ms);
            }

            for (smelt_item, smelt_qty) in &outcome.smelt_needs {
                application_state.note_smelt_need(smelt_item.clone(), *smelt_qty);
            }
            if !outcome.smelt_needs.is_empty() {
                ledger_guard.transition(request.id, RequestStatus::Smelting, now_ms);
            }

            if outcome.awaiting_materials {
                // MissingMaterials espera: el siguiente pase reintenta
                ledger_guard.transition(request.id, RequestStatus::Pending, now_ms);
            } else if outcome.job_ids.is_empty() && outcome.smelt_needs.is_empty() {
                // need <= 0: el stock ya cubre la meta
                ledger_guard.note_produced(request.id, request.qty, now_ms);
            }
        }
        Err(plan_fault) => match plan_fault {
            PlanFault::CycleDetected { .. } | PlanFault::MaxDepthExceeded { .. } => {
                warn!("💥 [REQUEST_FAIL]: Goal {} terminally failed: {}", request.id, plan_fault);
                ledger_guard.mark_failed(request.id, &plan_fault.to_string(), now_ms);
            }
            PlanFault::NoRecipe { ref item } => {
                if application_state.recipes.is_smeltable(&item.base_id) {
                    application_state.note_smelt_need(item.clone(), request.qty);
                    ledger_guard.transition(request.id, RequestStatus::Smelting, now_ms);
                } else {
                    ledger_guard.mark_failed(request.id, &plan_fault.to_string(), now_ms);
                }
            }
        },
    }
}

/// Cobertura por stock de una meta delegada a fundición.
fn check_smelt_coverage(application_state: &AppState, request: &Request) {
    let now_ms = application_state.now_ms();
    let covered = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.get_stock(&request.item) >= u64::from(request.qty)
    };

    if covered {
        let mut ledger_guard = application_state
            .ledger
            .lock()
            .expect("LOCK_POISONED: Request ledger");
        ledger_guard.note_produced(request.id, request.qty.saturating_sub(request.produced), now_ms);
    }
}

/// Entrega física de una meta lista hacia su contenedor destino.
async fn deliver_request(application_state: &AppState, request: &Request) {
    let now_ms = application_state.now_ms();

    let destination = match &request.deliver_to {
        Some(destination) => destination.clone(),
        None => {
            // Sin destino la meta se satisface en el almacenamiento
            let mut ledger_guard = application_state
                .ledger
                .lock()
                .expect("LOCK_POISONED: Request ledger");
            ledger_guard.note_delivered(request.id, request.qty.saturating_sub(request.delivered), now_ms);
            return;
        }
    };

    let remaining = request.qty.saturating_sub(request.delivered);
    if remaining == 0 {
        return;
    }

    match application_state
        .engine
        .withdraw(&application_state.index, &request.item, remaining, &destination, None)
        .await
    {
        Ok(summary) if summary.moved > 0 => {
            let delivered = summary.moved.min(u64::from(remaining)) as u32;
            info!("📦 [REQUEST_DELIVER]: Goal {} delivered {} x [{}] to [{}].",
                request.id, delivered, request.item, destination);
            let mut ledger_guard = application_state
                .ledger
                .lock()
                .expect("LOCK_POISONED: Request ledger");
            ledger_guard.note_delivered(request.id, delivered, application_state.now_ms());
        }
        Ok(_) => {}
        Err(policy_fault) => {
            warn!("⛔ [REQUEST_DELIVER]: Delivery of goal {} refused: {}", request.id, policy_fault);
        }
    }
}
