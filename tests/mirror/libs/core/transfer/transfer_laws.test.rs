// [tests/mirror/libs/core/transfer/transfer_laws.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LEYES DEL MOTOR (V5.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: LEYES DE PLAN, ÉXITO PARCIAL Y GUARDIA DE EXPORT
 *
 * # Mathematical Proof (Plan Laws):
 * Para todo plan: transferred_i <= want_i <= available_i; la suma
 * por tarea iguala el retorno agregado; y ningún par (contenedor,
 * ranura) aparece dos veces en vuelo.
 * =================================================================
 */

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use telar_core_index::InventoryIndex;
use telar_core_transfer::{build_transfer_plan, SourceStack, TransferEngine, TransferFault};
use telar_domain_models::{ContainerRole, ContainerSnapshot, ItemKey, SlotItem, SlotMap};
use telar_infra_driver::{FabricDriver, SimulatedFabric};

fn seed_index(index: &RwLock<InventoryIndex>, name: &str, role: ContainerRole, size: u32, entries: &[(u32, ItemKey, u32)]) {
    let mut slots = SlotMap::new();
    for (slot, key, count) in entries {
        slots.insert(*slot, SlotItem { key: key.clone(), count: *count, detail: None });
    }
    let mut index_guard = index.write().expect("test index");
    index_guard.observe_container(
        ContainerSnapshot { name: name.to_string(), size, slots },
        role,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Leyes del constructor de planes.
     */
    #[test]
    fn certify_plan_builder_laws() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating greedy plan allocation laws...");

        let coal = ItemKey::bare("minecraft:coal");
        let sources = vec![
            SourceStack { container: "chest_b".into(), slot: 7, key: coal.clone(), available: 50 },
            SourceStack { container: "chest_a".into(), slot: 3, key: coal.clone(), available: 30 },
            // Duplicado malicioso del mismo par (contenedor, ranura)
            SourceStack { container: "chest_b".into(), slot: 7, key: coal.clone(), available: 50 },
        ];

        let plan = build_transfer_plan(&sources, "ender_1", Some(1), 64);

        // Σ want <= quota, want_i <= available_i
        let want_total: u32 = plan.iter().map(|task| task.want).sum();
        assert!(want_total <= 64);
        for task in &plan {
            assert!(task.want <= 50);
        }

        // Un solo vuelo por (contenedor, ranura)
        let mut seen_slots = HashSet::new();
        for task in &plan {
            assert!(seen_slots.insert((task.source.clone(), task.source_slot)),
                "L1_LAW_BREACH: Duplicate in-flight slot {}:{}", task.source, task.source_slot);
        }

        // Asignación codiciosa: la pila mayor agota primero la cuota
        assert_eq!(plan[0].want, 50);
        assert_eq!(plan[1].want, 14);

        println!("   ✅ [SUCCESS]: Plan laws certified.");
    }

    /**
     * CERTIFICACIÓN: El agregado iguala la suma por tarea y los
     * conteos del driver son autoritativos (éxito parcial).
     */
    #[tokio::test]
    async fn certify_partial_success_accounting() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating authoritative transfer accounting...");

        let coal = ItemKey::bare("minecraft:coal");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_a", 9);
        fabric.add_container("chest_b", 9);
        fabric.add_container("sink", 9);
        fabric.seed_slot("chest_a", 3, coal.clone(), 30);
        fabric.seed_slot("chest_b", 7, coal.clone(), 50);

        let index = RwLock::new(InventoryIndex::new());
        seed_index(&index, "chest_a", ContainerRole::Storage, 9, &[(3, coal.clone(), 30)]);
        seed_index(&index, "chest_b", ContainerRole::Storage, 9, &[(7, coal.clone(), 50)]);
        seed_index(&index, "sink", ContainerRole::Storage, 9, &[]);

        let engine = TransferEngine::new(
            fabric.clone() as Arc<dyn FabricDriver>,
            HashSet::new(),
        );

        let summary = engine
            .withdraw(&index, &coal, 64, "sink", None)
            .await
            .expect("withdraw must not hit policy guards");

        assert_eq!(summary.moved, 64);
        let per_source_total: u64 = summary.per_source.values().sum();
        assert_eq!(per_source_total, summary.moved,
            "Aggregate must equal the per-source breakdown.");

        // La física del mundo concuerda con la contabilidad
        assert_eq!(fabric.count_of("sink", "minecraft:coal"), 64);
        assert_eq!(
            fabric.count_of("chest_a", "minecraft:coal")
                + fabric.count_of("chest_b", "minecraft:coal"),
            16
        );

        // El índice siguió los deltas con los conteos del driver
        let index_guard = index.read().expect("test index");
        assert_eq!(index_guard.get_stock(&coal), 80, "No items created nor destroyed.");
        assert!(index_guard.verify_invariants().is_ok());

        println!("   ✅ [SUCCESS]: Accounting laws certified.");
    }

    /**
     * CERTIFICACIÓN: Guardia de exportación — un buffer sin política
     * configurada rechaza todo push.
     */
    #[tokio::test]
    async fn certify_export_destination_guard() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating ambient-container push guard...");

        let coal = ItemKey::bare("minecraft:coal");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_a", 9);
        fabric.add_container("ambient_buffer", 9);
        fabric.seed_slot("chest_a", 1, coal.clone(), 10);

        let index = RwLock::new(InventoryIndex::new());
        seed_index(&index, "chest_a", ContainerRole::Storage, 9, &[(1, coal.clone(), 10)]);
        seed_index(&index, "ambient_buffer", ContainerRole::ExportBuffer, 9, &[]);

        // Motor SIN destinos de exportación configurados
        let engine = TransferEngine::new(fabric.clone() as Arc<dyn FabricDriver>, HashSet::new());

        let verdict = engine.withdraw(&index, &coal, 5, "ambient_buffer", None).await;
        assert!(matches!(verdict, Err(TransferFault::ForbiddenDestination { .. })),
            "Push into an unmanaged export buffer must be refused.");

        // Nada cruzó físicamente
        assert_eq!(fabric.count_of("ambient_buffer", "minecraft:coal"), 0);

        println!("   ✅ [SUCCESS]: Export guard certified.");
    }

    /**
     * CERTIFICACIÓN: Un contenedor desvanecido rinde 0 sin abortar.
     */
    #[tokio::test]
    async fn certify_unavailable_yields_zero() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating unavailable-source semantics...");

        let iron = ItemKey::bare("minecraft:iron_ingot");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("ghost", 9);
        fabric.add_container("sink", 9);
        fabric.seed_slot("ghost", 1, iron.clone(), 20);
        fabric.vanish("ghost");

        let index = RwLock::new(InventoryIndex::new());
        seed_index(&index, "ghost", ContainerRole::Storage, 9, &[(1, iron.clone(), 20)]);
        seed_index(&index, "sink", ContainerRole::Storage, 9, &[]);

        let engine = TransferEngine::new(fabric.clone() as Arc<dyn FabricDriver>, HashSet::new());
        let summary = engine.withdraw(&index, &iron, 20, "sink", None).await.expect("no guard");

        assert_eq!(summary.moved, 0, "Unavailable tasks yield 0 transferred; no retry here.");
        assert_eq!(fabric.count_of("sink", "minecraft:iron_ingot"), 0);

        println!("   ✅ [SUCCESS]: Unavailable semantics certified.");
    }
}
