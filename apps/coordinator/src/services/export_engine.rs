// [apps/coordinator/src/services/export_engine.rs]
/*!
 * =================================================================
 * APARATO: EXPORT POLICY ENGINE (V21.6 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EJECUCIÓN DECLARATIVA DE POLÍTICAS POR BUFFER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DECLARATIVE WALK: Cada tick recorre los ExportTargets y
 *    ejecuta stock/empty/vacuum con el Motor de Transferencias como
 *    único ejecutor físico.
 * 2. VACUUM SEMANTICS: El vacuum comodín expulsa los ítems que
 *    ningún otro SlotSpec del target reclama; el vacuum acotado
 *    expulsa lo que no satisface SU propio predicado.
 * 3. BATCH SESSION: El tick completo corre dentro de una sesión
 *    batch del índice; las vistas derivadas se reconstruyen una vez.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use telar_domain_models::{ExportTarget, ItemKey, SlotSpec, TargetMode};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Inicia el daemon del motor de exportación.
pub async fn spawn_export_daemon(application_state: AppState) {
    let mut export_ticker = interval(Duration::from_secs(
        application_state.config.intervals.export_secs,
    ));
    export_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("📤 [EXPORT_ENGINE]: Declarative policy daemon active ({} targets).",
            application_state.config.export_targets.len());
        loop {
            export_ticker.tick().await;
            if let Err(tick_fault) = execute_export_tick(&application_state).await {
                error!("❌ [EXPORT_FAULT]: Policy tick collapsed: {}", tick_fault);
            }
        }
    });
}

/// Ejecuta un tick completo del motor sobre todos los targets.
pub async fn execute_export_tick(application_state: &AppState) -> anyhow::Result<()> {
    {
        let mut index_guard = application_state
            .index
            .write()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.begin_batch();
    }

    for target in &application_state.config.export_targets {
        enforce_target(application_state, target).await;
    }

    {
        let mut index_guard = application_state
            .index
            .write()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.end_batch();
    }

    Ok(())
}

/// Aplica la política declarativa de un target individual.
async fn enforce_target(application_state: &AppState, target: &ExportTarget) {
    // Un fallo del driver sobre un contenedor jamás aborta el tick:
    // el target desconocido o stale se omite con rastro de depuración.
    let target_known = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.container(&target.container).is_some() && !index_guard.is_stale(&target.container)
    };
    if !target_known {
        debug!("💤 [EXPORT_SKIP]: Target [{}] unknown or stale this tick.", target.container);
        return;
    }

    // MODO EMPTY SIN ESPECIFICACIONES: drenaje total hacia storage
    if target.mode == TargetMode::Empty && target.slots.is_empty() {
        let drained = application_state
            .engine
            .deposit(&application_state.index, &target.container, None)
            .await;
        if drained > 0 {
            info!("📥 [EXPORT_DRAIN]: [{}] fully drained ({} items).", target.container, drained);
        }
        return;
    }

    for spec in &target.slots {
        // 1. PASADA DE VACUUM
        if spec.vacuum {
            vacuum_pass(application_state, target, spec).await;
        }

        // 2. El comodín solo participa del vacuum
        if spec.is_wildcard() {
            continue;
        }

        // 3. MEDICIÓN DEL CONTENIDO COINCIDENTE EN LA VENTANA
        let matching_now = measure_matching(application_state, &target.container, spec);

        match target.mode {
            TargetMode::Stock => {
                let goal = u64::from(spec.qty);
                if matching_now < goal {
                    let shortfall = (goal - matching_now).min(u64::from(u32::MAX)) as u32;
                    match application_state
                        .engine
                        .withdraw_matching(
                            &application_state.index,
                            spec,
                            shortfall,
                            &target.container,
                            spec.slot,
                        )
                        .await
                    {
                        Ok(summary) if summary.moved > 0 => {
                            info!("📤 [EXPORT_STOCK]: [{}] topped up with {} x [{}].",
                                target.container, summary.moved, spec.item);
                        }
                        Ok(_) => {}
                        Err(policy_fault) => {
                            warn!("⛔ [EXPORT_GUARD]: Push to [{}] refused: {}",
                                target.container, policy_fault);
                        }
                    }
                }
            }
            TargetMode::Empty => {
                if matching_now == 0 {
                    continue;
                }
                let residue = u64::from(spec.qty);
                let excess = if residue > 0 {
                    matching_now.saturating_sub(residue)
                } else {
                    matching_now
                };
                if excess > 0 {
                    drain_matching(application_state, &target.container, spec, excess).await;
                }
            }
        }
    }
}

/**
 * Expulsa de la ventana del spec todo ítem que no satisfaga el
 * predicado. Para el comodín, el predicado efectivo es "algún otro
 * spec del target lo reclama".
 */
async fn vacuum_pass(application_state: &AppState, target: &ExportTarget, spec: &SlotSpec) {
    let foreign_slots: Vec<(u32, ItemKey, u32)> = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        let entry = match index_guard.container(&target.container) {
            Some(entry) => entry,
            None => return,
        };

        entry
            .slots
            .iter()
            .filter(|(slot, _)| in_window(spec, **slot))
            .filter(|(_, slot_item)| {
                if spec.is_wildcard() {
                    // Foráneo = ningún spec no-comodín del target lo admite
                    !target
                        .slots
                        .iter()
                        .filter(|sibling| !sibling.is_wildcard())
                        .any(|sibling| sibling.admits(&slot_item.key))
                } else {
                    !spec.admits(&slot_item.key)
                }
            })
            .map(|(slot, slot_item)| (*slot, slot_item.key.clone(), slot_item.count))
            .collect()
    };

    for (slot, key, count) in foreign_slots {
        let expelled = application_state
            .engine
            .pull_to_storage(&application_state.index, &target.container, slot, &key, count)
            .await;
        if expelled > 0 {
            info!("🧹 [EXPORT_VACUUM]: Expelled {} x [{}] from [{}:{}].",
                expelled, key, target.container, slot);
        }
    }
}

/// Conteo coincidente dentro de la ventana del spec.
fn measure_matching(application_state: &AppState, container: &str, spec: &SlotSpec) -> u64 {
    let index_guard = application_state
        .index
        .read()
        .expect("LOCK_POISONED: Inventory index");
    let entry = match index_guard.container(container) {
        Some(entry) => entry,
        None => return 0,
    };

    entry
        .slots
        .iter()
        .filter(|(slot, slot_item)| in_window(spec, **slot) && spec.admits(&slot_item.key))
        .map(|(_, slot_item)| u64::from(slot_item.count))
        .sum()
}

/// Drena hasta `excess` unidades coincidentes hacia el storage.
async fn drain_matching(application_state: &AppState, container: &str, spec: &SlotSpec, excess: u64) {
    let drain_candidates: Vec<(u32, ItemKey, u32)> = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        match index_guard.container(container) {
            Some(entry) => entry
                .slots
                .iter()
                .filter(|(slot, slot_item)| in_window(spec, **slot) && spec.admits(&slot_item.key))
                .map(|(slot, slot_item)| (*slot, slot_item.key.clone(), slot_item.count))
                .collect(),
            None => Vec::new(),
        }
    };

    let mut remaining = excess;
    for (slot, key, available) in drain_candidates {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(u64::from(available)) as u32;
        let moved = application_state
            .engine
            .pull_to_storage(&application_state.index, container, slot, &key, take)
            .await;
        remaining = remaining.saturating_sub(moved);
        if moved > 0 {
            info!("📥 [EXPORT_EMPTY]: Drained {} x [{}] from [{}:{}].", moved, key, container, slot);
        }
    }
}

/// ¿Cae la ranura dentro de la ventana del spec (o ventana total)?
fn in_window(spec: &SlotSpec, slot: u32) -> bool {
    match spec.slot_window() {
        Some(window) => window.contains(&slot),
        None => true,
    }
}
