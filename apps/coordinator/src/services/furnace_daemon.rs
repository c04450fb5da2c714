// [apps/coordinator/src/services/furnace_daemon.rs]
/*!
 * =================================================================
 * APARATO: SMELTING ORCHESTRATOR (V21.5 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: CICLO DE FUNDICIÓN — SALIDAS, COMBUSTIBLE, ENTRADAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. THREE-PHASE TICK: (1) drenar salidas, (2) reabastecer
 *    combustible por prioridad de sitio, (3) particionar déficits de
 *    entrada entre los hornos disponibles.
 * 2. FUEL PURITY: Jamás se mezclan grados de combustible en una
 *    misma ranura; el grado existente manda.
 * 3. BATCH SESSION: El tick completo corre dentro de una sesión
 *    batch del índice para amortizar las vistas derivadas.
 * =================================================================
 */

use crate::state::AppState;
use std::time::Duration;
use telar_domain_models::{ContainerRole, ItemKey};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Ranura de entrada de material fundible.
const FURNACE_INPUT_SLOT: u32 = 1;
/// Ranura de combustible.
const FURNACE_FUEL_SLOT: u32 = 2;
/// Ranura de salida de producto fundido.
const FURNACE_OUTPUT_SLOT: u32 = 3;
/// Capacidad física de una ranura de horno.
const FURNACE_SLOT_CAPACITY: u32 = 64;
/// Umbral de reabastecimiento de combustible.
const FUEL_LOW_WATERMARK: u32 = 8;

/// Inicia el daemon del orquestador de fundición.
pub async fn spawn_furnace_daemon(application_state: AppState) {
    let mut furnace_ticker = interval(Duration::from_secs(
        application_state.config.intervals.furnace_secs,
    ));
    furnace_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("🔥 [SMELT_ORCH]: Furnace orchestration daemon active.");
        loop {
            furnace_ticker.tick().await;
            if !application_state.config.smelting.enabled {
                continue;
            }
            if let Err(tick_fault) = execute_furnace_tick(&application_state).await {
                error!("❌ [SMELT_FAULT]: Furnace tick collapsed: {}", tick_fault);
            }
        }
    });
}

/// Ejecuta un ciclo trifásico de fundición.
pub async fn execute_furnace_tick(application_state: &AppState) -> anyhow::Result<()> {
    let furnaces: Vec<String> = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard
            .container_names()
            .into_iter()
            .filter(|name| {
                index_guard.role_of(name) == Some(ContainerRole::Furnace)
                    && !index_guard.is_stale(name)
            })
            .collect()
    };

    if furnaces.is_empty() {
        return Ok(());
    }

    {
        let mut index_guard = application_state
            .index
            .write()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.begin_batch();
    }

    drain_outputs(application_state, &furnaces).await;
    replenish_fuel(application_state, &furnaces).await;
    schedule_inputs(application_state, &furnaces).await;

    {
        let mut index_guard = application_state
            .index
            .write()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.end_batch();
    }

    Ok(())
}

/// FASE 1: drenar la ranura de salida de cada horno hacia storage.
async fn drain_outputs(application_state: &AppState, furnaces: &[String]) {
    for furnace in furnaces {
        let output = {
            let index_guard = application_state
                .index
                .read()
                .expect("LOCK_POISONED: Inventory index");
            index_guard
                .container(furnace)
                .and_then(|entry| entry.slots.get(&FURNACE_OUTPUT_SLOT))
                .map(|slot_item| (slot_item.key.clone(), slot_item.count))
        };

        if let Some((key, count)) = output {
            let pulled = application_state
                .engine
                .pull_to_storage(
                    &application_state.index,
                    furnace,
                    FURNACE_OUTPUT_SLOT,
                    &key,
                    count,
                )
                .await;
            if pulled > 0 {
                info!("🔥 [SMELT_OUT]: Harvested {} x [{}] from [{}].", pulled, key, furnace);
            }
        }
    }
}

/// FASE 2: reabastecer combustible respetando la prioridad del sitio.
async fn replenish_fuel(application_state: &AppState, furnaces: &[String]) {
    for furnace in furnaces {
        let fuel_state = {
            let index_guard = application_state
                .index
                .read()
                .expect("LOCK_POISONED: Inventory index");
            index_guard
                .container(furnace)
                .map(|entry| {
                    entry
                        .slots
                        .get(&FURNACE_FUEL_SLOT)
                        .map(|slot_item| (Some(slot_item.key.clone()), slot_item.count))
                        .unwrap_or((None, 0))
                })
        };

        let (existing_grade, current_fuel) = match fuel_state {
            Some(state) => state,
            None => continue,
        };
        if current_fuel >= FUEL_LOW_WATERMARK {
            continue;
        }

        // Selección de grado: el existente manda (pureza de ranura);
        // con ranura vacía, el primer grado de la prioridad con stock.
        let chosen_grade: Option<ItemKey> = match existing_grade {
            Some(grade) => Some(grade),
            None => {
                let index_guard = application_state
                    .index
                    .read()
                    .expect("LOCK_POISONED: Inventory index");
                application_state
                    .recipes
                    .fuel_priority()
                    .iter()
                    .map(|fuel| fuel.item.clone())
                    .find(|candidate| index_guard.get_stock(candidate) > 0)
            }
        };

        let fuel_key = match chosen_grade {
            Some(fuel_key) => fuel_key,
            None => {
                debug!("💤 [SMELT_FUEL]: No fuel grade in stock for [{}].", furnace);
                continue;
            }
        };

        let topup = FURNACE_SLOT_CAPACITY - current_fuel;
        match application_state
            .engine
            .withdraw(
                &application_state.index,
                &fuel_key,
                topup,
                furnace,
                Some(FURNACE_FUEL_SLOT),
            )
            .await
        {
            Ok(summary) if summary.moved > 0 => {
                info!("⛽ [SMELT_FUEL]: [{}] refueled with {} x [{}].", furnace, summary.moved, fuel_key);
            }
            Ok(_) => {}
            Err(policy_fault) => {
                warn!("⛔ [SMELT_FUEL]: Refuel of [{}] refused: {}", furnace, policy_fault);
            }
        }
    }
}

/// FASE 3: particionar los déficits de salida entre los hornos.
async fn schedule_inputs(application_state: &AppState, furnaces: &[String]) {
    // Déficits configurados del sitio + pizarra dinámica del planificador
    let mut deficits: Vec<(ItemKey, u32)> = Vec::new();
    {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        for target in &application_state.config.smelting.targets {
            let current = index_guard.get_stock(&target.item);
            let deficit = u64::from(target.qty).saturating_sub(current);
            if deficit > 0 {
                deficits.push((target.item.clone(), deficit.min(u64::from(u32::MAX)) as u32));
            }
        }
    }
    for (item, outstanding) in application_state.smelt_board_snapshot() {
        deficits.push((item, outstanding));
    }

    for (output_item, deficit) in deficits {
        let rule = match application_state.recipes.smelt_rule(&output_item.base_id) {
            Some(rule) => rule.clone(),
            None => {
                debug!("💤 [SMELT_PLAN]: No smelt rule yields [{}].", output_item);
                continue;
            }
        };
        let input_key = ItemKey::bare(rule.input.clone());

        let input_available = {
            let index_guard = application_state
                .index
                .read()
                .expect("LOCK_POISONED: Inventory index");
            index_guard.get_stock(&input_key)
        };
        let to_schedule = u64::from(deficit).min(input_available);
        if to_schedule == 0 {
            continue;
        }

        // Partición equitativa entre hornos, acotada por la física
        // de la ranura de entrada.
        let furnace_count = furnaces.len() as u64;
        let per_furnace_share = to_schedule.div_ceil(furnace_count).min(u64::from(FURNACE_SLOT_CAPACITY)) as u32;

        let mut scheduled_total = 0u32;
        for furnace in furnaces {
            if u64::from(scheduled_total) >= to_schedule {
                break;
            }

            let input_space = {
                let index_guard = application_state
                    .index
                    .read()
                    .expect("LOCK_POISONED: Inventory index");
                match index_guard
                    .container(furnace)
                    .and_then(|entry| entry.slots.get(&FURNACE_INPUT_SLOT))
                {
                    // Jamás mezclar materiales en la ranura de entrada
                    Some(slot_item) if slot_item.key != input_key => 0,
                    Some(slot_item) => FURNACE_SLOT_CAPACITY.saturating_sub(slot_item.count),
                    None => FURNACE_SLOT_CAPACITY,
                }
            };

            let portion = per_furnace_share
                .min(input_space)
                .min((to_schedule - u64::from(scheduled_total)) as u32);
            if portion == 0 {
                continue;
            }

            match application_state
                .engine
                .withdraw(
                    &application_state.index,
                    &input_key,
                    portion,
                    furnace,
                    Some(FURNACE_INPUT_SLOT),
                )
                .await
            {
                Ok(summary) => {
                    let moved = summary.moved.min(u64::from(u32::MAX)) as u32;
                    scheduled_total += moved;
                    if moved > 0 {
                        info!("🔥 [SMELT_IN]: [{}] loaded with {} x [{}].", furnace, moved, input_key);
                    }
                }
                Err(policy_fault) => {
                    warn!("⛔ [SMELT_IN]: Load of [{}] refused: {}", furnace, policy_fault);
                }
            }
        }

        if scheduled_total > 0 {
            application_state.settle_smelt_need(&output_item, scheduled_total);
        }
    }
}
