// [apps/coordinator/src/services/heartbeat.rs]
/*!
 * =================================================================
 * APARATO: HEARTBEAT PINGER (V21.1 - FABRIC GOLD)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: PULSO PERIÓDICO PING SOBRE EL CANAL DEL TEJIDO
 *
 * # Logic:
 * Los agentes silenciosos responden PONG al pulso, refrescando su
 * last_seen antes de que el barrido de salud los degrade.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use telar_domain_models::MessagePayload;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Inicia el daemon de pulso PING.
pub async fn spawn_heartbeat_daemon(application_state: AppState) {
    let mut pulse_ticker = interval(Duration::from_secs(
        application_state.config.intervals.heartbeat_secs,
    ));
    pulse_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("💓 [HEARTBEAT]: Grid pulse daemon active.");
        loop {
            pulse_ticker.tick().await;

            let pulse = MessagePayload::Ping {
                status: None,
                current_job: None,
            };
            if let Err(link_fault) = application_state.bus.broadcast(pulse).await {
                debug!("💤 [HEARTBEAT_SKIP]: Pulse not emitted: {}", link_fault);
            }
        }
    });
}
