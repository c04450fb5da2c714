// [tests/mirror/apps/coordinator/services/export_policy.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL MOTOR DE EXPORTACIÓN (V7.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: ESCENARIOS STOCK / EMPTY / VACUUM DE EXTREMO A EXTREMO
 * =================================================================
 */

use std::sync::Arc;
use telar_coordinator::config::CoordinatorConfig;
use telar_coordinator::services::{execute_export_tick, execute_scan};
use telar_coordinator::state::AppState;
use telar_domain_models::{
    ExportTarget, ItemKey, NbtMode, RecipeBook, SlotSpec, TargetMode,
};
use telar_infra_bus::{BusLink, LoopbackLink};
use telar_infra_driver::{FabricDriver, SimulatedFabric};

fn slot_spec(item: &str, qty: u32, slot: Option<u32>, vacuum: bool) -> SlotSpec {
    SlotSpec {
        item: item.to_string(),
        qty,
        slot,
        slot_start: None,
        slot_end: None,
        nbt_mode: NbtMode::Any,
        nbt_hash: None,
        vacuum,
    }
}

async fn forge_state(
    fabric: Arc<SimulatedFabric>,
    export_targets: Vec<ExportTarget>,
) -> (AppState, tempfile::TempDir) {
    let vault_root = tempfile::tempdir().expect("ephemeral vault");
    let mut config = CoordinatorConfig::for_testing(vault_root.path().to_path_buf());
    config.roles.storage = vec!["chest_".into()];
    config.export_targets = export_targets;

    let (coordinator_side, _agent_side) = LoopbackLink::pair();
    let (state, _transactions) = AppState::new(
        Arc::new(config),
        fabric as Arc<dyn FabricDriver>,
        Arc::new(coordinator_side) as Arc<dyn BusLink>,
        RecipeBook::default(),
    )
    .expect("state ignition");

    execute_scan(&state, true).await.expect("initial scan");
    (state, vault_root)
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Escenario 'stock fill' — la ranura gobernada
     * se aprovisiona a 64 y el residuo queda en una sola ubicación.
     */
    #[tokio::test]
    async fn certify_stock_mode_fill() {
        println!("\n🧪 [PROVING_GROUNDS]: Scenario: stock mode fill to 64...");

        let coal = ItemKey::bare("minecraft:coal");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_a", 27);
        fabric.add_container("chest_b", 27);
        fabric.add_container("ender_1", 9);
        fabric.seed_slot("chest_a", 3, coal.clone(), 30);
        fabric.seed_slot("chest_b", 7, coal.clone(), 50);

        let target = ExportTarget {
            container: "ender_1".into(),
            mode: TargetMode::Stock,
            slots: vec![slot_spec("minecraft:coal", 64, Some(1), false)],
        };
        let (state, _vault) = forge_state(Arc::clone(&fabric), vec![target]).await;

        execute_export_tick(&state).await.expect("tick");

        // El target quedó aprovisionado exactamente a 64 en la ranura 1
        let ender_slots = fabric.slots_of("ender_1");
        assert_eq!(ender_slots.get(&1).map(|slot_item| slot_item.count), Some(64));
        assert_eq!(fabric.count_of("ender_1", "minecraft:coal"), 64);

        // El residuo de 16 quedó en una única ubicación de storage
        assert_eq!(
            fabric.count_of("chest_a", "minecraft:coal")
                + fabric.count_of("chest_b", "minecraft:coal"),
            16
        );
        {
            let index_guard = state.index.read().expect("index");
            let storage_locations = index_guard.find_item(&coal, true);
            assert_eq!(storage_locations.len(), 1, "Exactly one residual stack remains.");
            assert_eq!(storage_locations[0].count, 16);
            assert!(index_guard.verify_invariants().is_ok());
        }

        // Idempotencia: un segundo tick no mueve nada
        execute_export_tick(&state).await.expect("second tick");
        assert_eq!(fabric.count_of("ender_1", "minecraft:coal"), 64);

        println!("   ✅ [SUCCESS]: Stock fill scenario certified.");
    }

    /**
     * CERTIFICACIÓN: Escenario 'empty drain' con residuo permitido.
     */
    #[tokio::test]
    async fn certify_empty_mode_drain_with_residue() {
        println!("\n🧪 [PROVING_GROUNDS]: Scenario: empty mode drain to residue 10...");

        let iron = ItemKey::bare("minecraft:iron_ingot");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_c", 27);
        fabric.add_container("ender_2", 9);
        fabric.seed_slot("ender_2", 1, iron.clone(), 25);

        let target = ExportTarget {
            container: "ender_2".into(),
            mode: TargetMode::Empty,
            slots: vec![slot_spec("minecraft:iron_ingot", 10, None, false)],
        };
        let (state, _vault) = forge_state(Arc::clone(&fabric), vec![target]).await;

        execute_export_tick(&state).await.expect("tick");

        assert_eq!(fabric.count_of("ender_2", "minecraft:iron_ingot"), 10);
        assert_eq!(fabric.count_of("chest_c", "minecraft:iron_ingot"), 15,
            "The drained 15 ingots land in storage.");

        println!("   ✅ [SUCCESS]: Empty drain scenario certified.");
    }

    /**
     * CERTIFICACIÓN: Escenario 'vacuum comodín' — lo foráneo sale,
     * lo reclamado se aprovisiona.
     */
    #[tokio::test]
    async fn certify_vacuum_wildcard() {
        println!("\n🧪 [PROVING_GROUNDS]: Scenario: wildcard vacuum + stick top-up...");

        let stick = ItemKey::bare("minecraft:stick");
        let dirt = ItemKey::bare("minecraft:dirt");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_d", 27);
        fabric.add_container("ender_3", 9);
        fabric.seed_slot("chest_d", 1, stick.clone(), 20);
        fabric.seed_slot("ender_3", 1, stick.clone(), 4);
        fabric.seed_slot("ender_3", 2, dirt.clone(), 3);
        fabric.seed_slot("ender_3", 3, stick.clone(), 9);

        let target = ExportTarget {
            container: "ender_3".into(),
            mode: TargetMode::Stock,
            slots: vec![
                slot_spec("*", 0, None, true),
                slot_spec("minecraft:stick", 16, Some(1), false),
            ],
        };
        let (state, _vault) = forge_state(Arc::clone(&fabric), vec![target]).await;

        execute_export_tick(&state).await.expect("tick");

        // La tierra foránea fue expulsada al storage
        assert_eq!(fabric.count_of("ender_3", "minecraft:dirt"), 0);
        assert_eq!(fabric.count_of("chest_d", "minecraft:dirt"), 3);

        // La ranura 1 quedó aprovisionada a 16 (4 + 12 del storage)
        let ender_slots = fabric.slots_of("ender_3");
        assert_eq!(ender_slots.get(&1).map(|slot_item| slot_item.count), Some(16));
        // Los sticks reclamados fuera de la ventana no se tocaron
        assert_eq!(ender_slots.get(&3).map(|slot_item| slot_item.count), Some(9));
        assert_eq!(fabric.count_of("chest_d", "minecraft:stick"), 8);

        println!("   ✅ [SUCCESS]: Vacuum scenario certified.");
    }
}
