// [apps/coordinator/src/services/fleet_command.rs]
/*!
 * =================================================================
 * APARATO: FLEET COMMAND CENTER (V21.2 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EMISIÓN DE MANDOS CON CICLO ACK ACOTADO
 *
 * # Logic:
 * Un COMMAND viaja con command_id de correlación; el agente debe
 * reconocerlo (ACK) dentro del plazo. La ausencia de ACK se
 * interpreta como agente fuera de línea y el mando expira.
 * =================================================================
 */

use crate::errors::AgentFault;
use crate::state::AppState;
use std::time::Duration;
use telar_domain_models::{AgentHealth, CommandVerb, MessagePayload};
use tokio::time::timeout;
use tracing::{info, warn};

/// Plazo de reconocimiento de un mando de flota.
const COMMAND_ACK_TIMEOUT_SECONDS: u64 = 10;

/**
 * Emite un mando a un agente de flota y espera su reconocimiento.
 *
 * # Errors:
 * - `AgentNotFound`: el id no figura en la rejilla.
 * - `AgentOffline`: salud offline o ACK ausente dentro del plazo.
 */
pub async fn issue_command(
    application_state: &AppState,
    agent_id: &str,
    verb: CommandVerb,
    params: serde_json::Value,
) -> Result<(), AgentFault> {
    let now_ms = application_state.now_ms();

    // 1. GUARDIAS DE REJILLA
    if application_state.registry.get(agent_id).is_none() {
        return Err(AgentFault::AgentNotFound {
            agent: agent_id.to_string(),
        });
    }
    if application_state.registry.health_at(agent_id, now_ms) == Some(AgentHealth::Offline) {
        return Err(AgentFault::AgentOffline {
            agent: agent_id.to_string(),
        });
    }

    // 2. REGISTRO DE CORRELACIÓN Y EMISIÓN
    let command_id = uuid::Uuid::new_v4().to_string();
    let resolution = application_state.commands.register(&command_id);

    let envelope = MessagePayload::Command {
        command: verb,
        command_id: command_id.clone(),
        params,
    };

    if application_state.bus.send(envelope, agent_id).await.is_err() {
        application_state.commands.discard(&command_id);
        return Err(AgentFault::AgentOffline {
            agent: agent_id.to_string(),
        });
    }

    info!("🎮 [FLEET_CMD]: {:?} issued to [{}] as {}.", verb, agent_id, command_id);

    // 3. ESPERA ACOTADA DEL RECONOCIMIENTO
    match timeout(Duration::from_secs(COMMAND_ACK_TIMEOUT_SECONDS), resolution).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(agent_error))) => {
            warn!("⚠️ [FLEET_CMD]: [{}] rejected {:?}: {}", agent_id, verb, agent_error);
            Err(AgentFault::AgentBusy {
                agent: agent_id.to_string(),
            })
        }
        _ => {
            application_state.commands.discard(&command_id);
            warn!("⏱️ [FLEET_CMD]: No ACK from [{}] for {:?} within bound.", agent_id, verb);
            Err(AgentFault::AgentOffline {
                agent: agent_id.to_string(),
            })
        }
    }
}
