// [apps/coordinator/src/services/bus_pump.rs]
/*!
 * =================================================================
 * APARATO: INBOUND PROTOCOL PUMP (V21.7 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: HANDLERS DEL PROTOCOLO Y BOMBA ENTRANTE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SYNCHRONOUS HANDLERS: Los handlers corren síncronos dentro del
 *    bucle de recepción y traducen sobres en intenciones sobre el
 *    estado (registro, cola, libro mayor, eventos).
 * 2. REPLY SPAWNING: Las respuestas (PONG, AISLE-PONG) se disparan
 *    en tareas aparte; un handler jamás suspende la bomba.
 * 3. PROTOCOL TOLERANCE: Fallos de cola ante sobres duplicados
 *    (at-least-once) se degradan a rastro de depuración.
 * =================================================================
 */

use crate::state::{AppState, CoordinatorEvent};
use std::sync::Arc;
use telar_domain_models::{AgentKind, AgentStatus, Envelope, MessagePayload, RequestStatus};
use tracing::{debug, error, info, warn};

/// Registra todos los handlers del protocolo sobre el bus.
pub fn register_protocol_handlers(application_state: &AppState) {
    register_liveness_handlers(application_state);
    register_craft_handlers(application_state);
    register_work_handlers(application_state);
    register_fleet_handlers(application_state);
}

/// Inicia la bomba entrante perpetua en el reactor de Tokio.
pub async fn spawn_bus_pump(application_state: AppState) {
    register_protocol_handlers(&application_state);

    tokio::spawn(async move {
        info!("📨 [BUS_PUMP]: Inbound protocol pump active as [{}].",
            application_state.bus.self_id());
        loop {
            if let Err(pump_fault) = application_state.bus.run_pump().await {
                error!("❌ [PUMP_FAULT]: Inbound pump collapsed: {}. Re-arming in 1s.", pump_fault);
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    });
}

// --- HANDLERS DE VIVACIDAD ---

fn register_liveness_handlers(application_state: &AppState) {
    let state = application_state.clone();
    application_state.bus.on("STATUS", move |envelope| {
        if let MessagePayload::Status { status, current_job, .. } = &envelope.payload {
            let now_ms = state.now_ms();
            state.registry.update_status(
                &envelope.sender_id,
                AgentKind::Worker,
                *status,
                *current_job,
                now_ms,
            );
            match status {
                AgentStatus::Idle => publish_idle_event(&state, &envelope.sender_id),
                // Un STATUS ocupado con job confirma el inicio físico
                // del crafteo: es este pulso, no la asignación, el que
                // saca a la meta dueña del intervalo queued.
                AgentStatus::Busy => {
                    if let Some(job_id) = current_job {
                        note_crafting_started(&state, *job_id);
                    }
                }
                AgentStatus::Offline => {}
            }
        }
    });

    let state = application_state.clone();
    application_state.bus.on("PONG", move |envelope| {
        let now_ms = state.now_ms();
        state.registry.touch(&envelope.sender_id, AgentKind::Worker, now_ms);
    });

    let state = application_state.clone();
    application_state.bus.on("PING", move |envelope| {
        let now_ms = state.now_ms();
        state.registry.touch(&envelope.sender_id, AgentKind::Worker, now_ms);
        reply_detached(&state, envelope, MessagePayload::Pong {
            status: None,
            current_job: None,
        });
    });

    let state = application_state.clone();
    application_state.bus.on("AISLE-PING", move |envelope| {
        if let MessagePayload::AislePing { aisle, .. } = &envelope.payload {
            let now_ms = state.now_ms();
            state.registry.touch(&envelope.sender_id, AgentKind::Aisle, now_ms);
            reply_detached(&state, envelope, MessagePayload::AislePong {
                aisle: aisle.clone(),
                self_id: state.bus.self_id().to_string(),
                redstone: None,
                last_seen: now_ms,
            });
        }
    });
}

// --- HANDLERS DE CICLO DE CRAFTEO ---

fn register_craft_handlers(application_state: &AppState) {
    let state = application_state.clone();
    application_state.bus.on("CRAFT_COMPLETE", move |envelope| {
        if let MessagePayload::CraftComplete { job_id, actual_output } = &envelope.payload {
            settle_job_completion(&state, &envelope.sender_id, *job_id, *actual_output);
        }
    });

    let state = application_state.clone();
    application_state.bus.on("CRAFT_FAILED", move |envelope| {
        if let MessagePayload::CraftFailed { job_id, reason } = &envelope.payload {
            settle_job_failure(&state, &envelope.sender_id, *job_id, reason);
        }
    });
}

// --- HANDLERS DE CICLO DE TRABAJO GENÉRICO ---

fn register_work_handlers(application_state: &AppState) {
    let state = application_state.clone();
    application_state.bus.on("WORK_COMPLETE", move |envelope| {
        if let MessagePayload::WorkComplete { job_id, actual_output } = &envelope.payload {
            settle_job_completion(&state, &envelope.sender_id, *job_id, *actual_output);
        }
    });

    let state = application_state.clone();
    application_state.bus.on("WORK_FAILED", move |envelope| {
        if let MessagePayload::WorkFailed { job_id, reason } = &envelope.payload {
            settle_job_failure(&state, &envelope.sender_id, *job_id, reason);
        }
    });
}

// --- HANDLERS DE CICLO DE MANDO DE FLOTA ---

fn register_fleet_handlers(application_state: &AppState) {
    let state = application_state.clone();
    application_state.bus.on("ACK", move |envelope| {
        if let MessagePayload::Ack { acknowledging } = &envelope.payload {
            state.commands.resolve_ack(acknowledging);
        }
    });

    application_state.bus.on("COMPLETE", move |envelope| {
        if let MessagePayload::Complete { command } = &envelope.payload {
            info!("🏁 [FLEET]: Agent [{}] completed command {}.", envelope.sender_id, command);
        }
    });

    application_state.bus.on("ERROR", move |envelope| {
        if let MessagePayload::Error { error } = &envelope.payload {
            // El sobre ERROR no porta correlación; el mando en vuelo
            // expira por timeout y aquí solo queda el rastro forense.
            warn!("⚠️ [FLEET]: Agent [{}] reported error: {}", envelope.sender_id, error);
        }
    });
}

// --- MOTORES INTERNOS DE LIQUIDACIÓN ---

/**
 * Sella la transición `assigned -> crafting` del job reportado y
 * promueve la meta dueña de `queued` a `crafting`.
 */
fn note_crafting_started(state: &AppState, job_id: u64) {
    let now_ms = state.now_ms();

    let started = {
        let mut queue_guard = state.queue.lock().expect("LOCK_POISONED: Job queue");
        queue_guard.start_crafting(job_id, now_ms)
    };

    match started {
        Ok(()) => {
            let owner = {
                let ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.owner_of_job(job_id)
            };
            if let Some(request_id) = owner {
                let mut ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.transition(request_id, RequestStatus::Crafting, now_ms);
            }
        }
        Err(queue_fault) => {
            // Redelivery at-least-once: el job ya estaba en crafteo
            debug!("💤 [SETTLE_SKIP]: Crafting pulse for job {} ignored: {}", job_id, queue_fault);
        }
    }
}

fn settle_job_completion(state: &AppState, agent_id: &str, job_id: u64, actual_output: Option<u32>) {
    let now_ms = state.now_ms();

    let settled_job = {
        let mut queue_guard = state.queue.lock().expect("LOCK_POISONED: Job queue");
        queue_guard.complete(job_id, actual_output, now_ms)
    };

    match settled_job {
        Ok(job) => {
            state.events.publish(CoordinatorEvent::CraftComplete {
                job_id,
                actual_output,
            });

            // Progreso del libro mayor de metas
            let owner = {
                let ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.owner_of_job(job_id)
            };
            if let Some(request_id) = owner {
                let produced = actual_output.unwrap_or(job.qty);
                let mut ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.note_produced(request_id, produced, now_ms);
            }
        }
        Err(queue_fault) => {
            // Redelivery at-least-once: el duplicado no es una anomalía
            debug!("💤 [SETTLE_SKIP]: Completion of job {} ignored: {}", job_id, queue_fault);
        }
    }

    state.registry.update_status(agent_id, AgentKind::Crafter, AgentStatus::Idle, None, now_ms);
    publish_idle_event(state, agent_id);
}

fn settle_job_failure(state: &AppState, agent_id: &str, job_id: u64, reason: &str) {
    let now_ms = state.now_ms();

    let failed_job = {
        let mut queue_guard = state.queue.lock().expect("LOCK_POISONED: Job queue");
        queue_guard.fail(job_id, reason, now_ms)
    };

    match failed_job {
        Ok(_) => {
            warn!("💥 [SETTLE_FAIL]: Job {} failed on [{}]: {}", job_id, agent_id, reason);
            state.events.publish(CoordinatorEvent::CraftFailed {
                job_id,
                reason: reason.to_string(),
            });

            let owner = {
                let ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.owner_of_job(job_id)
            };
            if let Some(request_id) = owner {
                let mut ledger_guard = state.ledger.lock().expect("LOCK_POISONED: Request ledger");
                ledger_guard.mark_failed(request_id, reason, now_ms);
            }
        }
        Err(queue_fault) => {
            debug!("💤 [SETTLE_SKIP]: Failure of job {} ignored: {}", job_id, queue_fault);
        }
    }

    state.registry.update_status(agent_id, AgentKind::Crafter, AgentStatus::Idle, None, now_ms);
}

/// Publica crafter_idle/worker_idle según la clase del agente.
fn publish_idle_event(state: &AppState, agent_id: &str) {
    let kind = state.registry.get(agent_id).map(|record| record.kind);
    match kind {
        Some(AgentKind::Crafter) => state.events.publish(CoordinatorEvent::CrafterIdle {
            agent: agent_id.to_string(),
        }),
        Some(_) => state.events.publish(CoordinatorEvent::WorkerIdle {
            agent: agent_id.to_string(),
        }),
        None => {}
    }
}

/// Dispara una respuesta en tarea aparte; la bomba jamás suspende.
fn reply_detached(state: &AppState, envelope: &Envelope, payload: MessagePayload) {
    let bus = Arc::clone(&state.bus);
    let reply_target = envelope.sender_id.clone();
    tokio::spawn(async move {
        if let Err(link_fault) = bus.send(payload, &reply_target).await {
            debug!("💤 [REPLY_SKIP]: Reply to [{}] not emitted: {}", reply_target, link_fault);
        }
    });
}
