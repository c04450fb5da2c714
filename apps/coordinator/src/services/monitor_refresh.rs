// [apps/coordinator/src/services/monitor_refresh.rs]
/*!
 * =================================================================
 * APARATO: MONITOR REFRESH DAEMON (V21.1 - FABRIC GOLD)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: RESUMEN PERIÓDICO PARA SUSCRIPTORES PASIVOS
 *
 * # Logic:
 * El renderizado es ajeno al núcleo; este daemon solo publica el
 * resumen observable que el monitor consume como suscriptor pasivo.
 * =================================================================
 */

use crate::state::{AppState, CoordinatorEvent};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// Inicia el daemon de refresco del monitor.
pub async fn spawn_monitor_refresh(application_state: AppState) {
    let mut refresh_ticker = interval(Duration::from_secs(
        application_state.config.intervals.monitor_secs,
    ));
    refresh_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🖥️ [MONITOR]: Passive summary daemon active.");
        loop {
            refresh_ticker.tick().await;

            let (tracked_containers, distinct_items) = {
                let index_guard = application_state
                    .index
                    .read()
                    .expect("LOCK_POISONED: Inventory index");
                (
                    index_guard.container_names().len(),
                    index_guard.stock_snapshot().len(),
                )
            };
            let pending_jobs = {
                let queue_guard = application_state
                    .queue
                    .lock()
                    .expect("LOCK_POISONED: Job queue");
                queue_guard.pending_count()
            };
            let open_requests = {
                let ledger_guard = application_state
                    .ledger
                    .lock()
                    .expect("LOCK_POISONED: Request ledger");
                ledger_guard.open_requests().len()
            };

            debug!("🖥️ [MONITOR]: {} containers, {} items, {} pending jobs, {} open goals.",
                tracked_containers, distinct_items, pending_jobs, open_requests);

            application_state.events.publish(CoordinatorEvent::MonitorRefresh {
                tracked_containers,
                distinct_items,
                pending_jobs,
                open_requests,
            });
        }
    });
}
