// [apps/coordinator/src/services/dispatcher.rs]
/*!
 * =================================================================
 * APARATO: JOB DISPATCHER (V21.4 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: ASIGNACIÓN DE JOBS PENDIENTES A AGENTES OCIOSOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CAPABILITY GATE: Solo agentes que reclamaron la capacidad
 *    'craft' reciben CRAFT_REQUEST; el auto-registro arranca sin
 *    capacidades por contrato.
 * 2. ROLLBACK TÁCTICO: Si el enlace rechaza el sobre, la asignación
 *    se revierte al frente de la cola y el agente vuelve a idle.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use telar_domain_models::{AgentStatus, MessagePayload};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Capacidad requerida para recibir jobs de crafteo.
const CRAFT_CAPABILITY: &str = "craft";

/// Inicia el daemon de despacho de jobs.
pub async fn spawn_dispatcher(application_state: AppState) {
    let mut dispatch_ticker = interval(Duration::from_secs(
        application_state.config.intervals.progress_secs,
    ));
    dispatch_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🚀 [DISPATCHER]: Job assignment daemon active.");
        loop {
            dispatch_ticker.tick().await;
            if let Err(dispatch_fault) = execute_dispatch_pass(&application_state).await {
                error!("❌ [DISPATCH_FAULT]: Assignment pass collapsed: {}", dispatch_fault);
            }
        }
    });
}

/**
 * Un pase de despacho: empareja jobs pendientes con agentes ociosos
 * capaces hasta agotar uno de los dos lados.
 */
pub async fn execute_dispatch_pass(application_state: &AppState) -> anyhow::Result<usize> {
    let mut dispatched_count = 0usize;

    loop {
        let now_ms = application_state.now_ms();

        // 1. INSPECCIÓN DEL FRENTE DE LA COLA
        let pending_job_id = {
            let queue_guard = application_state
                .queue
                .lock()
                .expect("LOCK_POISONED: Job queue");
            queue_guard.next_pending().map(|job| job.id)
        };
        let pending_job_id = match pending_job_id {
            Some(job_id) => job_id,
            None => break,
        };

        // 2. SELECCIÓN DETERMINISTA DE AGENTE OCIOSO CAPAZ
        let idle_agent = match application_state
            .registry
            .get_idle(Some(CRAFT_CAPABILITY), now_ms)
        {
            Some(agent) => agent,
            None => break,
        };

        // 3. SELLO DE PROPIEDAD EN LA COLA
        let assigned_job = {
            let mut queue_guard = application_state
                .queue
                .lock()
                .expect("LOCK_POISONED: Job queue");
            queue_guard.assign(pending_job_id, &idle_agent.id, now_ms)?
        };

        application_state.registry.update_status(
            &idle_agent.id,
            idle_agent.kind,
            AgentStatus::Busy,
            Some(assigned_job.id),
            now_ms,
        );

        // 4. EMISIÓN DEL SOBRE DE TRABAJO
        let envelope = MessagePayload::CraftRequest {
            job: assigned_job.clone(),
        };
        if let Err(link_fault) = application_state.bus.send(envelope, &idle_agent.id).await {
            warn!("⚠️ [DISPATCH_ROLLBACK]: Link refused job {} for [{}]: {}. Re-queueing.",
                assigned_job.id, idle_agent.id, link_fault);

            let mut queue_guard = application_state
                .queue
                .lock()
                .expect("LOCK_POISONED: Job queue");
            queue_guard.rollback_assignment(assigned_job.id, application_state.now_ms())?;
            drop(queue_guard);

            application_state.registry.update_status(
                &idle_agent.id,
                idle_agent.kind,
                AgentStatus::Idle,
                None,
                application_state.now_ms(),
            );
            break;
        }

        info!("🚀 [DISPATCH]: Job {} ([{}] x{}) engaged on agent [{}].",
            assigned_job.id, assigned_job.output, assigned_job.qty, idle_agent.id);
        dispatched_count += 1;
    }

    Ok(dispatched_count)
}
