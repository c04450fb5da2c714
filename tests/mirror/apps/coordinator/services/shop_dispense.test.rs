// [tests/mirror/apps/coordinator/services/shop_dispense.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DISPENSADO DE TIENDA (V7.3 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: STOCK PARCIAL, REEMBOLSO Y CUARENTENA ANTI-BUCLE
 * =================================================================
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;
use telar_coordinator::config::{AisleBinding, CoordinatorConfig};
use telar_coordinator::services::shop_gateway::{create_product, process_transaction};
use telar_coordinator::services::{execute_scan, RefundSink};
use telar_coordinator::state::AppState;
use telar_domain_models::{ItemKey, Product, RecipeBook, TransactionRecord};
use telar_infra_bus::{BusLink, LoopbackLink, MessageBus};
use telar_infra_driver::{FabricDriver, SimulatedFabric};
use telar_infra_store::names;

/// Sink de Proving Grounds: captura cada reembolso emitido.
#[derive(Default)]
struct RecordingRefundSink {
    ledger: Mutex<Vec<(String, f64, String)>>,
}

impl RefundSink for RecordingRefundSink {
    fn refund(&self, recipient: &str, value: f64, message: &str) {
        self.ledger
            .lock()
            .expect("sink ledger")
            .push((recipient.to_string(), value, message.to_string()));
    }
}

async fn forge_shop(
    fabric: Arc<SimulatedFabric>,
) -> (AppState, MessageBus, tempfile::TempDir) {
    let vault_root = tempfile::tempdir().expect("ephemeral vault");
    let mut config = CoordinatorConfig::for_testing(vault_root.path().to_path_buf());
    config.roles.storage = vec!["chest_".into()];
    config.roles.agent_inboxes = vec!["aisle_bin".into()];
    config.shop.enabled = true;
    config.shop.advert_name = "Telar Emporium".into();
    config.shop.aisles = vec![AisleBinding {
        agent_id: "aisle-1".into(),
        container: "aisle_bin".into(),
    }];

    let (coordinator_side, aisle_side) = LoopbackLink::pair();
    let (state, _transactions) = AppState::new(
        Arc::new(config),
        fabric as Arc<dyn FabricDriver>,
        Arc::new(coordinator_side) as Arc<dyn BusLink>,
        RecipeBook::default(),
    )
    .expect("state ignition");

    let aisle_bus = MessageBus::new("aisle-1", None, Arc::new(aisle_side) as Arc<dyn BusLink>);

    execute_scan(&state, true).await.expect("initial scan");
    (state, aisle_bus, vault_root)
}

fn purchase(id: &str, value: f64, metadata: &str) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        from: "kst_buyer".to_string(),
        to: "kst_shop".to_string(),
        value,
        metadata: metadata.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Escenario 6 — dispensado con stock parcial,
     * reembolso del remanente y cuarentena de metadatos de operador.
     */
    #[tokio::test]
    async fn certify_partial_stock_dispense_and_quarantine() {
        println!("\n🧪 [PROVING_GROUNDS]: Scenario: glass x3 at 0.05, purchase of 0.20...");

        let glass = ItemKey::bare("minecraft:glass");
        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_g", 27);
        fabric.add_container("aisle_bin", 9);
        fabric.seed_slot("chest_g", 1, glass.clone(), 3);

        let (state, aisle_bus, _vault) = forge_shop(Arc::clone(&fabric)).await;

        create_product(
            &state,
            Product {
                code: "glass".into(),
                display_name: "Glass Block".into(),
                item: glass.clone(),
                price: 0.05,
                aisle: Some("aisle-1".into()),
            },
        )
        .expect("catalogue entry");

        let refund_sink = RecordingRefundSink::default();

        // COMPRA 1: valor 0.20 paga 4, el stock solo cubre 3
        process_transaction(&state, &refund_sink, purchase("tx-1", 0.20, "glass")).await;

        assert_eq!(fabric.count_of("aisle_bin", "minecraft:glass"), 3,
            "Exactly the live stock is dispensed.");
        assert_eq!(fabric.count_of("chest_g", "minecraft:glass"), 0);

        {
            let refunds = refund_sink.ledger.lock().expect("sink ledger");
            assert_eq!(refunds.len(), 1);
            let (recipient, value, message) = &refunds[0];
            assert_eq!(recipient, "kst_buyer");
            assert!((value - 0.05).abs() < 1e-9, "Refund is 0.20 - 3 x 0.05 = 0.05.");
            assert!(message.starts_with("message="), "Courtesy refunds carry message=.");
        }

        // El pasillo recibió la orden de entrega COMMAND
        let deliver_order = aisle_bus
            .receive(Some(Duration::from_secs(1)))
            .await
            .expect("link alive")
            .expect("command within bound");
        assert_eq!(deliver_order.payload.kind(), "COMMAND");

        // La venta quedó sellada en la analítica
        let sales_store = state.stores.store(names::SALES).expect("sales store");
        assert!(sales_store.contains("tx-1"));

        // COMPRA 2: metadatos de operador -> cuarentena, SIN reembolso
        process_transaction(&state, &refund_sink, purchase("tx-2", 0.10, "error=x; glass")).await;

        let pending_store = state.stores.store(names::PENDING_REFUNDS).expect("pending store");
        assert!(pending_store.contains("tx-2"), "Operator-tagged purchases are parked.");
        assert_eq!(refund_sink.ledger.lock().expect("sink ledger").len(), 1,
            "No auto-refund may fire for quarantined transactions.");

        println!("   ✅ [SUCCESS]: Dispense scenario certified.");
    }

    /**
     * CERTIFICACIÓN: Compra sin producto cotejable — reembolso
     * íntegro con mensaje de ayuda.
     */
    #[tokio::test]
    async fn certify_unknown_product_refund() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating unknown-product help refund...");

        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_h", 27);
        fabric.add_container("aisle_bin", 9);

        let (state, _aisle_bus, _vault) = forge_shop(Arc::clone(&fabric)).await;
        let refund_sink = RecordingRefundSink::default();

        process_transaction(&state, &refund_sink, purchase("tx-9", 0.30, "nonsense")).await;

        let refunds = refund_sink.ledger.lock().expect("sink ledger");
        assert_eq!(refunds.len(), 1);
        let (_, value, message) = &refunds[0];
        assert!((value - 0.30).abs() < 1e-9, "Full value refunded on no match.");
        assert!(message.starts_with("error="), "Help refunds carry the error= key.");

        println!("   ✅ [SUCCESS]: Help refund certified.");
    }

    /**
     * CERTIFICACIÓN: Guardia de ambigüedad del catálogo — variantes
     * NBT múltiples exigen precisión del operador.
     */
    #[tokio::test]
    async fn certify_ambiguous_product_rejection() {
        println!("\n🧪 [PROVING_GROUNDS]: Validating catalogue ambiguity guard...");

        let plain_potion = ItemKey::bare("minecraft:potion");
        let tagged_potion =
            ItemKey::with_hash("minecraft:potion", "c8a9dcc05492c27f6ef3fbcdacd0bfc3");

        let fabric = Arc::new(SimulatedFabric::new());
        fabric.add_container("chest_i", 27);
        fabric.add_container("aisle_bin", 9);
        fabric.seed_slot("chest_i", 1, plain_potion.clone(), 4);
        fabric.seed_slot("chest_i", 2, tagged_potion, 4);

        let (state, _aisle_bus, _vault) = forge_shop(Arc::clone(&fabric)).await;

        let verdict = create_product(
            &state,
            Product {
                code: "potion".into(),
                display_name: "Mystery Potion".into(),
                item: plain_potion,
                price: 0.10,
                aisle: Some("aisle-1".into()),
            },
        );

        assert!(verdict.is_err(),
            "Two stocked NBT variants without a pinned hash must be rejected, never guessed.");

        println!("   ✅ [SUCCESS]: Ambiguity guard certified.");
    }
}
