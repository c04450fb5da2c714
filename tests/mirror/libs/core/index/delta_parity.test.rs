// [tests/mirror/libs/core/index/delta_parity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DELTAS Y CICLO DE VIDA (V4.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: CRÉDITO SIN RANURA, SESIONES BATCH Y DESALOJO
 * =================================================================
 */

use telar_core_index::InventoryIndex;
use telar_domain_models::{ContainerRole, ContainerSnapshot, ItemKey, SlotItem, SlotMap};

fn snapshot(name: &str, size: u32, entries: &[(u32, ItemKey, u32)]) -> ContainerSnapshot {
    let mut slots = SlotMap::new();
    for (slot, key, count) in entries {
        slots.insert(
            *slot,
            SlotItem {
                key: key.clone(),
                count: *count,
                detail: None,
            },
        );
    }
    ContainerSnapshot {
        name: name.to_string(),
        size,
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Crédito con ranura destino desconocida.
     * El Stock queda exacto de inmediato y el contenedor dirty.
     */
    #[test]
    fn certify_unpinned_credit_keeps_stock_exact() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating dest-slot-unknown delta path...");

        let coal = ItemKey::bare("minecraft:coal");
        let mut index = InventoryIndex::new();
        index.observe_container(
            snapshot("chest_a", 9, &[(3, coal.clone(), 40)]),
            ContainerRole::Storage,
        );
        index.observe_container(snapshot("chest_b", 9, &[]), ContainerRole::Storage);

        index.record_transfer("chest_a", 3, "chest_b", None, &coal, 15);

        assert_eq!(index.get_stock(&coal), 40, "L1_DRIFT: Stock total must survive the move.");
        assert!(index.container("chest_b").expect("tracked").dirty,
            "Destination must be flagged dirty until the next authoritative rescan.");
        assert!(index.verify_invariants().is_ok());

        // Ranuras vacías del origen: invariante (5)
        assert_eq!(index.empty_slot_count("chest_a"), 8);

        println!("   ✅ [SUCCESS]: Unpinned credit certified.");
    }

    /**
     * CERTIFICACIÓN: Sesión batch — vistas derivadas reconstruidas
     * una única vez al cierre.
     */
    #[test]
    fn certify_batch_session_rebuild() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating batch session amortization...");

        let iron = ItemKey::bare("minecraft:iron_ingot");
        let mut index = InventoryIndex::new();
        index.observe_container(
            snapshot("silo", 27, &[(1, iron.clone(), 30), (2, iron.clone(), 20)]),
            ContainerRole::Storage,
        );
        index.observe_container(snapshot("annex", 27, &[]), ContainerRole::Storage);

        index.begin_batch();
        index.record_transfer("silo", 1, "annex", Some(1), &iron, 10);
        index.record_transfer("silo", 2, "annex", Some(2), &iron, 20);

        // En sesión abierta el Stock sigue exacto en caliente
        assert_eq!(index.get_stock(&iron), 50);
        assert!(index.in_batch());

        index.end_batch();
        assert!(!index.in_batch());
        assert!(index.verify_invariants().is_ok());

        let locations = index.find_item(&iron, true);
        let located_total: u64 = locations.iter().map(|location| u64::from(location.count)).sum();
        assert_eq!(located_total, 50);

        println!("   ✅ [SUCCESS]: Batch rebuild certified.");
    }

    /**
     * CERTIFICACIÓN: Política de desalojo — dos scans ausentes
     * consecutivos eliminan el contenedor con sus derivadas.
     */
    #[test]
    fn certify_absent_container_eviction() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating two-strike eviction policy...");

        let coal = ItemKey::bare("minecraft:coal");
        let mut index = InventoryIndex::new();
        index.observe_container(
            snapshot("flaky_chest", 9, &[(1, coal.clone(), 12)]),
            ContainerRole::Storage,
        );

        // Primer scan ausente: retenido pero stale (se omite en candidatos)
        assert!(!index.mark_unreachable("flaky_chest"));
        assert!(index.is_stale("flaky_chest"));
        assert_eq!(index.get_stock(&coal), 12, "Stale entries are retained.");
        assert!(index.find_item(&coal, true).is_empty(),
            "Stale containers must be excluded from transfer candidates.");

        // Segundo scan ausente: desalojo con purga de derivadas
        assert!(index.mark_unreachable("flaky_chest"));
        assert!(index.container("flaky_chest").is_none());
        assert_eq!(index.get_stock(&coal), 0);
        assert!(index.verify_invariants().is_ok());

        // Reaparición: un scan lo reintegra limpio
        index.observe_container(
            snapshot("flaky_chest", 9, &[(1, coal.clone(), 12)]),
            ContainerRole::Storage,
        );
        assert!(!index.is_stale("flaky_chest"));
        assert_eq!(index.get_stock(&coal), 12);

        println!("   ✅ [SUCCESS]: Eviction lifecycle certified.");
    }

    /**
     * CERTIFICACIÓN: Orden determinista de candidatos de origen.
     */
    #[test]
    fn certify_source_ordering() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating largest-stack-first ordering...");

        let coal = ItemKey::bare("minecraft:coal");
        let mut index = InventoryIndex::new();
        index.observe_container(
            snapshot("chest_a", 9, &[(3, coal.clone(), 30)]),
            ContainerRole::Storage,
        );
        index.observe_container(
            snapshot("chest_b", 9, &[(7, coal.clone(), 50), (2, coal.clone(), 30)]),
            ContainerRole::Storage,
        );

        let candidates = index.find_item(&coal, true);
        let ordered: Vec<(String, u32, u32)> = candidates
            .into_iter()
            .map(|location| (location.container, location.slot, location.count))
            .collect();

        // Pila mayor primero; empates por (contenedor, ranura)
        assert_eq!(
            ordered,
            vec![
                ("chest_b".to_string(), 7, 50),
                ("chest_a".to_string(), 3, 30),
                ("chest_b".to_string(), 2, 30),
            ]
        );

        println!("   ✅ [SUCCESS]: Deterministic ordering certified.");
    }
}
