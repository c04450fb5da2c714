// [apps/coordinator/src/services/scan_daemon.rs]
/*!
 * =================================================================
 * APARATO: INVENTORY SCAN DAEMON (V21.4 - FABRIC GOLD)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: RESINCRONIZACIÓN AUTORITATIVA CONTRA LA REALIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GROUND TRUTH CYCLE: El scan periódico es la fuente de verdad
 *    del índice; los deltas solo puentean entre fronteras de scan.
 * 2. PARALLEL SWEEP: list()/size() se disparan en paralelo sobre
 *    todos los contenedores; un periférico colgado consume su
 *    timeout sin detener el barrido.
 * 3. EVICTION POLICY: Un contenedor ausente en dos scans
 *    consecutivos se elimina con todas sus derivadas.
 * =================================================================
 */

use crate::state::AppState;
use futures::future::join_all;
use std::time::Duration;
use telar_domain_models::{ContainerSnapshot, SlotMap};
use telar_infra_store::names;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Cota de una llamada list()/size() individual durante el barrido.
const SCAN_CALL_TIMEOUT_SECONDS: u64 = 10;

/// Sondas de detalle opaco por ciclo de scan.
const DETAIL_PROBE_LIMIT_PER_SCAN: usize = 16;

/// Reporte de un ciclo de scan completado.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub observed: usize,
    pub unreachable: usize,
    pub evicted: usize,
}

/// Inicia el daemon de scan periódico en el reactor de Tokio.
pub async fn spawn_scan_daemon(application_state: AppState) {
    let mut scan_ticker = interval(Duration::from_secs(
        application_state.config.intervals.scan_secs,
    ));
    scan_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🔍 [SCAN_DAEMON]: Ground-truth resynchronization daemon active.");
        loop {
            scan_ticker.tick().await;
            let force_discovery = application_state.consume_forced_rescan();
            if let Err(scan_fault) = execute_scan(&application_state, force_discovery).await {
                error!("❌ [SCAN_FAULT]: Resynchronization cycle collapsed: {}", scan_fault);
            }
        }
    });
}

/**
 * Ejecuta un ciclo de scan completo.
 *
 * Con `force_discovery` (o índice vacío) se redescubre el tejido
 * antes de listar; en caso contrario solo se refrescan los
 * contenedores ya rastreados.
 */
pub async fn execute_scan(
    application_state: &AppState,
    force_discovery: bool,
) -> anyhow::Result<ScanReport> {
    let call_bound = Duration::from_secs(SCAN_CALL_TIMEOUT_SECONDS);

    // 1. CENSO DE NOMBRES A BARRER
    let mut sweep_targets: Vec<String> = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.container_names()
    };

    if force_discovery || sweep_targets.is_empty() {
        match timeout(call_bound, application_state.driver.discover()).await {
            Ok(Ok(discovered)) => {
                for name in discovered {
                    if !sweep_targets.contains(&name) {
                        sweep_targets.push(name);
                    }
                }
            }
            Ok(Err(discovery_fault)) => {
                warn!("⚠️ [SCAN_DISCOVERY]: Fabric discovery failed: {}", discovery_fault);
            }
            Err(_) => warn!("⏱️ [SCAN_DISCOVERY]: Fabric discovery exceeded bound."),
        }
    }

    // 2. BARRIDO PARALELO list() + size()
    let sweep_futures = sweep_targets.iter().map(|container_name| {
        let driver = std::sync::Arc::clone(&application_state.driver);
        let container_name = container_name.clone();
        async move {
            let observation = async {
                let slots: SlotMap = driver.list(&container_name).await?;
                let size = driver.size(&container_name).await?;
                Ok::<(SlotMap, u32), telar_infra_driver::DriverFault>((slots, size))
            };
            match timeout(call_bound, observation).await {
                Ok(result) => (container_name, Some(result)),
                Err(_) => (container_name, None),
            }
        }
    });

    let sweep_results = join_all(sweep_futures).await;

    // 3. INTEGRACIÓN ATÓMICA EN SESIÓN BATCH
    let mut report = ScanReport::default();
    {
        let mut index_guard = application_state
            .index
            .write()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.begin_batch();

        for (container_name, observation) in sweep_results {
            match observation {
                Some(Ok((slots, size))) => {
                    let role = application_state.config.roles.classify(&container_name);
                    index_guard.observe_container(
                        ContainerSnapshot {
                            name: container_name,
                            size,
                            slots,
                        },
                        role,
                    );
                    report.observed += 1;
                }
                Some(Err(driver_fault)) => {
                    debug!("💤 [SCAN_SKIP]: [{}] transient-unavailable: {}",
                        container_name, driver_fault);
                    report.unreachable += 1;
                    if index_guard.mark_unreachable(&container_name) {
                        report.evicted += 1;
                    }
                }
                None => {
                    report.unreachable += 1;
                    if index_guard.mark_unreachable(&container_name) {
                        report.evicted += 1;
                    }
                }
            }
        }

        index_guard.end_batch();

        // Auditoría de invariantes en la frontera de scan
        if let Err(invariant_breach) = index_guard.verify_invariants() {
            drop(index_guard);
            application_state.trigger_forced_rescan(&invariant_breach);
            anyhow::bail!("INVARIANT_BREACH: {}", invariant_breach);
        }
    }

    // 4. SONDAS DE DETALLE OPACO (primera observación gana)
    probe_missing_details(application_state, call_bound).await;

    // 5. PERSISTENCIA ADVISORY DE CACHES
    persist_cache_snapshots(application_state)?;

    info!("🔍 [SCAN_SEAL]: Cycle closed: {} observed, {} unreachable, {} evicted.",
        report.observed, report.unreachable, report.evicted);
    Ok(report)
}

/// Sondea detail() para identidades aún sin blob cacheado.
async fn probe_missing_details(application_state: &AppState, call_bound: Duration) {
    let probe_targets: Vec<(String, u32, telar_domain_models::ItemKey)> = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");

        let mut probes = Vec::new();
        for container_name in index_guard.container_names() {
            if probes.len() >= DETAIL_PROBE_LIMIT_PER_SCAN {
                break;
            }
            if let Some(entry) = index_guard.container(&container_name) {
                for (slot, slot_item) in &entry.slots {
                    if probes.len() >= DETAIL_PROBE_LIMIT_PER_SCAN {
                        break;
                    }
                    if index_guard.detail_of(&slot_item.key).is_none() {
                        probes.push((container_name.clone(), *slot, slot_item.key.clone()));
                    }
                }
            }
        }
        probes
    };

    for (container_name, slot, key) in probe_targets {
        let detail_call = application_state.driver.detail(&container_name, slot);
        if let Ok(Ok(Some(slot_detail))) = timeout(call_bound, detail_call).await {
            let mut index_guard = application_state
                .index
                .write()
                .expect("LOCK_POISONED: Inventory index");
            index_guard.remember_detail(key, slot_detail.opaque_fields);
        }
    }
}

/// Vuelca stock-cache y detail-cache (advisory, no para corrección).
fn persist_cache_snapshots(application_state: &AppState) -> anyhow::Result<()> {
    let (stock_snapshot, detail_snapshot) = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        (index_guard.stock_snapshot(), index_guard.detail_snapshot())
    };

    let stock_store = application_state.stores.store(names::STOCK_CACHE)?;
    stock_store.set("snapshot", &stock_snapshot)?;

    let detail_store = application_state.stores.store(names::DETAIL_CACHE)?;
    detail_store.set("snapshot", &detail_snapshot)?;

    Ok(())
}
