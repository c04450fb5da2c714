// [tests/mirror/apps/coordinator/services/smelting_cycle.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CICLO DE FUNDICIÓN (V7.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: COSECHA DE SALIDAS, COMBUSTIBLE Y CARGA DE ENTRADAS
 * =================================================================
 */

use std::sync::Arc;
use telar_coordinator::config::{CoordinatorConfig, SmeltTarget};
use telar_coordinator::services::{execute_furnace_tick, execute_scan};
use telar_coordinator::state::AppState;
use telar_domain_models::{FuelGrade, ItemKey, RecipeBook, SmeltRule};
use telar_infra_bus::{BusLink, LoopbackLink};
use telar_infra_driver::{FabricDriver, SimulatedFabric};

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Un tick trifásico completo del orquestador.
     */
    #[tokio::test]
    async fn certify_three_phase_furnace_tick() {
        println!("\n🧪 [PROVING_GROUNDS]: Walking the three-phase smelting tick...");

        let iron_ore = ItemKey::bare("minecraft:iron_ore");
        let iron_ingot = ItemKey::bare("minecraft:iron_ingot");
        let coal = ItemKey::bare("minecraft:coal");

        // MUNDO: un horno con 5 lingotes cosechables y storage con
        // mena y carbón.
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_e", 27);
        fabric.add_container("furnace_1", 3);
        fabric.seed_slot("chest_e", 1, iron_ore.clone(), 32);
        fabric.seed_slot("chest_e", 2, coal.clone(), 20);
        fabric.seed_slot("furnace_1", 3, iron_ingot.clone(), 5);

        let vault_root = tempfile::tempdir().expect("ephemeral vault");
        let mut config = CoordinatorConfig::for_testing(vault_root.path().to_path_buf());
        config.roles.storage = vec!["chest_".into()];
        config.roles.furnaces = vec!["furnace_".into()];
        config.smelting.enabled = true;
        config.smelting.targets = vec![SmeltTarget {
            item: iron_ingot.clone(),
            qty: 10,
        }];

        let recipes = RecipeBook::new(
            Vec::new(),
            vec![SmeltRule {
                input: "minecraft:iron_ore".into(),
                output: iron_ingot.clone(),
            }],
            vec![FuelGrade {
                item: coal.clone(),
                smelts_per_unit: 8,
            }],
        );

        let (coordinator_side, _agent_side) = LoopbackLink::pair();
        let (state, _transactions) = AppState::new(
            Arc::new(config),
            Arc::clone(&fabric) as Arc<dyn FabricDriver>,
            Arc::new(coordinator_side) as Arc<dyn BusLink>,
            recipes,
        )
        .expect("state ignition");

        execute_scan(&state, true).await.expect("initial scan");
        execute_furnace_tick(&state).await.expect("furnace tick");

        let furnace_slots = fabric.slots_of("furnace_1");

        // FASE 1: la salida fue cosechada al storage
        assert!(furnace_slots.get(&3).is_none(), "Output slot must be harvested.");
        assert_eq!(fabric.count_of("chest_e", "minecraft:iron_ingot"), 5);

        // FASE 2: combustible cargado desde la prioridad del sitio
        assert_eq!(
            furnace_slots.get(&2).map(|slot_item| (slot_item.key.clone(), slot_item.count)),
            Some((coal.clone(), 20)),
            "All 20 coal flow into the fuel slot (top-up bound by stock)."
        );

        // FASE 3: el déficit (10 objetivo - 5 en stock) cargó 5 menas
        assert_eq!(
            furnace_slots.get(&1).map(|slot_item| (slot_item.key.clone(), slot_item.count)),
            Some((iron_ore.clone(), 5)),
            "Input deficit partitions onto the furnace input slot."
        );
        assert_eq!(fabric.count_of("chest_e", "minecraft:iron_ore"), 27);

        // El índice siguió el ciclo completo sin romper invariantes
        {
            let index_guard = state.index.read().expect("index");
            assert!(index_guard.verify_invariants().is_ok());
            assert_eq!(index_guard.get_stock(&iron_ingot), 5);
        }

        println!("   ✅ [SUCCESS]: Three-phase tick certified.");
    }

    /**
     * CERTIFICACIÓN: La pureza de combustible se respeta — una
     * ranura con un grado distinto jamás se mezcla.
     */
    #[tokio::test]
    async fn certify_fuel_purity() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating fuel grade purity...");

        let coal = ItemKey::bare("minecraft:coal");
        let blaze_rod = ItemKey::bare("minecraft:blaze_rod");

        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_f", 27);
        fabric.add_container("furnace_2", 3);
        fabric.seed_slot("chest_f", 1, coal.clone(), 40);
        // La ranura de combustible ya porta otro grado, por debajo
        // del umbral de reabastecimiento.
        fabric.seed_slot("furnace_2", 2, blaze_rod.clone(), 2);

        let vault_root = tempfile::tempdir().expect("ephemeral vault");
        let mut config = CoordinatorConfig::for_testing(vault_root.path().to_path_buf());
        config.roles.storage = vec!["chest_".into()];
        config.roles.furnaces = vec!["furnace_".into()];
        config.smelting.enabled = true;

        // Prioridad del sitio: carbón primero; sin vara en stock
        let recipes = RecipeBook::new(
            Vec::new(),
            Vec::new(),
            vec![
                FuelGrade { item: coal.clone(), smelts_per_unit: 8 },
                FuelGrade { item: blaze_rod.clone(), smelts_per_unit: 12 },
            ],
        );

        let (coordinator_side, _agent_side) = LoopbackLink::pair();
        let (state, _transactions) = AppState::new(
            Arc::new(config),
            Arc::clone(&fabric) as Arc<dyn FabricDriver>,
            Arc::new(coordinator_side) as Arc<dyn BusLink>,
            recipes,
        )
        .expect("state ignition");

        execute_scan(&state, true).await.expect("initial scan");
        execute_furnace_tick(&state).await.expect("furnace tick");

        // El grado existente manda: sin vara en stock, la ranura
        // queda como estaba y el carbón JAMÁS se mezcla.
        let furnace_slots = fabric.slots_of("furnace_2");
        assert_eq!(
            furnace_slots.get(&2).map(|slot_item| (slot_item.key.clone(), slot_item.count)),
            Some((blaze_rod, 2))
        );
        assert_eq!(fabric.count_of("furnace_2", "minecraft:coal"), 0);

        println!("   ✅ [SUCCESS]: Fuel purity certified.");
    }
}
