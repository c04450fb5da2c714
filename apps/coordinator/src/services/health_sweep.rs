// [apps/coordinator/src/services/health_sweep.rs]
/*!
 * =================================================================
 * APARATO: AGENT HEALTH SWEEP (V21.2 - FABRIC GOLD)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: VEREDICTOS DE SALUD Y EVENTOS DE TRANSICIÓN
 *
 * # Logic:
 * El barrido computa la salud derivada de cada agente y emite
 * agent_status_change EXACTAMENTE en las transiciones. Los agentes
 * de pasillo emiten además su evento de canal dedicado.
 * =================================================================
 */

use crate::state::{AppState, CoordinatorEvent};
use std::time::Duration;
use telar_domain_models::AgentKind;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Inicia el daemon de barrido de salud de la rejilla.
pub async fn spawn_health_sweep(application_state: AppState) {
    let mut sweep_ticker = interval(Duration::from_secs(
        application_state.config.intervals.health_secs,
    ));
    sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🩺 [HEALTH_SWEEP]: Grid surveillance daemon active.");
        loop {
            sweep_ticker.tick().await;
            execute_sweep_pass(&application_state);
        }
    });
}

/// Un pase de barrido: transiciones -> eventos observables.
pub fn execute_sweep_pass(application_state: &AppState) {
    let now_ms = application_state.now_ms();
    let transitions = application_state.registry.sweep(now_ms);

    for (agent_id, current_health, previous_health) in transitions {
        warn!("🩺 [HEALTH_SHIFT]: Agent [{}] {:?} -> {:?}.",
            agent_id, previous_health, current_health);

        application_state.events.publish(CoordinatorEvent::AgentStatusChange {
            agent: agent_id.clone(),
            health: current_health,
            previous: previous_health,
        });

        if application_state
            .registry
            .get(&agent_id)
            .map(|record| record.kind == AgentKind::Aisle)
            .unwrap_or(false)
        {
            application_state.events.publish(CoordinatorEvent::AisleStatusChange {
                aisle: agent_id,
                health: current_health,
                previous: previous_health,
            });
        }
    }
}
