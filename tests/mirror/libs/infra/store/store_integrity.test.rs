// [tests/mirror/libs/infra/store/store_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE PERSISTENCIA LOCAL (V4.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: SOBRESCRITURA ATÓMICA Y ESCRITURAS COALESCIDAS
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use telar_infra_store::{RecordStore, StoreHub};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SampleRecord {
    label: String,
    magnitude: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Roundtrip clave -> JSON con reapertura.
     */
    #[test]
    fn certify_roundtrip_across_reopen() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating durable roundtrip...");

        let vault_root = tempfile::tempdir().expect("ephemeral vault");

        {
            let store = RecordStore::open(vault_root.path(), "queue").expect("open");
            store
                .set("alpha", &SampleRecord { label: "first".into(), magnitude: 7 })
                .expect("persist");
        }

        // Reapertura: el documento sobrevive al proceso
        let reopened = RecordStore::open(vault_root.path(), "queue").expect("reopen");
        let recovered: SampleRecord = reopened.get("alpha").expect("record survives");
        assert_eq!(recovered, SampleRecord { label: "first".into(), magnitude: 7 });

        println!("   ✅ [SUCCESS]: Roundtrip certified.");
    }

    /**
     * CERTIFICACIÓN: Sobrescritura atómica — jamás un residuo .tmp.
     */
    #[test]
    fn certify_atomic_overwrite_leaves_no_staging() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating atomic overwrite...");

        let vault_root = tempfile::tempdir().expect("ephemeral vault");
        let store = RecordStore::open(vault_root.path(), "sales").expect("open");

        for sequence in 0..5u64 {
            store
                .set("rolling", &SampleRecord { label: "roll".into(), magnitude: sequence })
                .expect("persist");
        }

        let final_document = vault_root.path().join("sales.json");
        let staging_document = vault_root.path().join("sales.json.tmp");
        assert!(final_document.exists());
        assert!(!staging_document.exists(), "The staging file must never survive a flush.");

        println!("   ✅ [SUCCESS]: Atomicity certified.");
    }

    /**
     * CERTIFICACIÓN: Sesión batch — un único volcado a disco.
     */
    #[test]
    fn certify_batch_coalescing() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating write coalescing...");

        let vault_root = tempfile::tempdir().expect("ephemeral vault");
        let store = RecordStore::open(vault_root.path(), "requests").expect("open");

        // Estado base en disco: un registro
        store
            .set("seed", &SampleRecord { label: "seed".into(), magnitude: 0 })
            .expect("persist");

        store.begin_batch();
        for sequence in 1..=3u64 {
            store
                .set(
                    &format!("deferred_{}", sequence),
                    &SampleRecord { label: "batch".into(), magnitude: sequence },
                )
                .expect("staged");
        }

        // Con la sesión abierta el disco sigue en el estado base
        let mid_batch_document =
            std::fs::read_to_string(vault_root.path().join("requests.json")).expect("readable");
        let mid_batch: std::collections::BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&mid_batch_document).expect("valid document");
        assert_eq!(mid_batch.len(), 1, "Batched writes must not touch disk yet.");

        store.end_batch().expect("single flush");

        let sealed_document =
            std::fs::read_to_string(vault_root.path().join("requests.json")).expect("readable");
        let sealed: std::collections::BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&sealed_document).expect("valid document");
        assert_eq!(sealed.len(), 4, "The batch collapses into one complete flush.");

        println!("   ✅ [SUCCESS]: Coalescing certified.");
    }

    /**
     * CERTIFICACIÓN: El hub entrega una instancia única por nombre.
     */
    #[test]
    fn certify_hub_single_instance_per_name() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating hub instance caching...");

        let vault_root = tempfile::tempdir().expect("ephemeral vault");
        let hub = StoreHub::new(vault_root.path());

        let first = hub.store("aisles").expect("open");
        let second = hub.store("aisles").expect("cached");
        assert!(std::sync::Arc::ptr_eq(&first, &second),
            "Writes must serialize through one lock per file.");

        println!("   ✅ [SUCCESS]: Hub caching certified.");
    }
}
