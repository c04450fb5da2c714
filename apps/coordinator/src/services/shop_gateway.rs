// [apps/coordinator/src/services/shop_gateway.rs]
/*!
 * =================================================================
 * APARATO: SHOP POINT-OF-SALE GATEWAY (V21.9 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: TRANSACCIONES, DISPENSADO, REEMBOLSOS Y ADVERTS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE GATEWAY: La pasarela de criptomoneda entra como flujo
 *    asíncrono de registros; los reembolsos salen por un sink
 *    inyectable. El núcleo jamás habla con la cadena.
 * 2. ANTI-LOOP QUARANTINE: Transacciones con claves de operador
 *    ('message', 'error') van a la cola persistente de reembolsos
 *    pendientes, NUNCA al auto-reembolso (evita bucles de rebote).
 * 3. PARTIAL DISPENSE: El dispensado se acota al stock vivo; el
 *    remanente de valor se reembolsa con mensaje de cortesía.
 * =================================================================
 */

use crate::errors::BoundaryFault;
use crate::state::{AppState, CoordinatorEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use telar_domain_models::{
    CommandVerb, MessagePayload, Product, ShopAdvertInfo, ShopAdvertItem, TransactionMetadata,
    TransactionRecord,
};
use telar_infra_store::names;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Cadencia de los adverts de descubrimiento SHOPSYNC.
const SHOPSYNC_ADVERT_INTERVAL_SECONDS: u64 = 30;

/// Mensaje de cortesía adjunto a los reembolsos de remanente.
const REFUND_COURTESY_MESSAGE: &str = "message=Here is your refund! Thank you for shopping with us.";

/// Mensaje de ayuda para compras que no cotejan producto alguno.
const REFUND_HELP_MESSAGE: &str =
    "error=Unknown product. Send the product code in the transaction metadata.";

/// Sink de reembolsos hacia la pasarela opaca.
pub trait RefundSink: Send + Sync {
    fn refund(&self, recipient: &str, value: f64, message: &str);
}

/// Sink nominal: registra el reembolso en el rastro (la pasarela
/// real se conecta en el despliegue).
pub struct LoggingRefundSink;

impl RefundSink for LoggingRefundSink {
    fn refund(&self, recipient: &str, value: f64, message: &str) {
        info!("💸 [REFUND]: {} <- {:.4} ({}).", recipient, value, message);
    }
}

/// Renglón de analítica sellado en el store de ventas.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaleRecord {
    transaction_id: String,
    product_code: String,
    qty: u32,
    unit_price: f64,
    gross_value: f64,
    refunded_value: f64,
    buyer: String,
    sealed_at_ms: u64,
}

/// Inicia la pasarela consumiendo el flujo de transacciones.
pub async fn spawn_shop_gateway(
    application_state: AppState,
    mut transaction_outlet: mpsc::Receiver<TransactionRecord>,
    refund_sink: Arc<dyn RefundSink>,
) {
    tokio::spawn(async move {
        info!("🛒 [SHOP_GATEWAY]: Point-of-sale gateway active.");
        while let Some(record) = transaction_outlet.recv().await {
            process_transaction(&application_state, refund_sink.as_ref(), record).await;
        }
        warn!("🛒 [SHOP_GATEWAY]: Transaction stream sealed. Gateway parked.");
    });
}

/// Procesa una transacción entrante de la pasarela.
pub async fn process_transaction(
    application_state: &AppState,
    refund_sink: &dyn RefundSink,
    record: TransactionRecord,
) {
    let now_ms = application_state.now_ms();

    application_state.events.publish(CoordinatorEvent::Transaction {
        transaction_id: record.id.clone(),
        value: record.value,
    });

    let metadata = TransactionMetadata::parse(&record.metadata);

    // 1. CUARENTENA ANTI-BUCLE: claves de operador presentes
    if metadata.carries_operator_keys() {
        warn!("🧾 [SHOP_QUARANTINE]: Transaction {} carries operator keys. Parked for manual refund.",
            record.id);
        if let Ok(pending_store) = application_state.stores.store(names::PENDING_REFUNDS) {
            let _ = pending_store.set(&record.id, &record);
        }
        return;
    }

    // 2. COTEJO DE PRODUCTO CONTRA LOS VALORES SUELTOS
    let matched_product = lookup_product(application_state, &metadata);
    let product = match matched_product {
        Some(product) => product,
        None => {
            refund_sink.refund(&record.from, record.value, REFUND_HELP_MESSAGE);
            return;
        }
    };

    // 3. CÁLCULO DE CANTIDAD PAGADA
    if product.price <= 0.0 {
        warn!("🧾 [SHOP_MISCONFIG]: Product [{}] has non-positive price.", product.code);
        refund_sink.refund(&record.from, record.value, REFUND_HELP_MESSAGE);
        return;
    }
    let paid_qty = (record.value / product.price).floor() as u32;
    if paid_qty == 0 {
        refund_sink.refund(&record.from, record.value, REFUND_HELP_MESSAGE);
        return;
    }

    // 4. DISPENSADO ACOTADO AL STOCK VIVO
    let dispensed = dispense(application_state, &product, paid_qty).await;

    // 5. REEMBOLSO DEL REMANENTE
    let refunded_value = record.value - f64::from(dispensed) * product.price;
    if refunded_value > f64::EPSILON {
        refund_sink.refund(&record.from, refunded_value, REFUND_COURTESY_MESSAGE);
    }

    // 6. SELLADO DE ANALÍTICA Y EVENTO OBSERVABLE
    if dispensed > 0 {
        seal_sale(application_state, &record, &product, dispensed, refunded_value, now_ms);
        application_state.events.publish(CoordinatorEvent::Purchase {
            product_code: product.code.clone(),
            qty: dispensed,
            value: record.value,
            buyer: record.from.clone(),
        });
        info!("🛒 [SHOP_SALE]: {} x [{}] dispensed for {} (refund {:.4}).",
            dispensed, product.code, record.from, refunded_value.max(0.0));
    }
}

/// Coteja los bareValues del metadato contra el catálogo persistente.
fn lookup_product(application_state: &AppState, metadata: &TransactionMetadata) -> Option<Product> {
    let products_store = application_state.stores.store(names::PRODUCTS).ok()?;
    for bare_value in &metadata.bare_values {
        for code in products_store.keys() {
            if code.eq_ignore_ascii_case(bare_value) {
                if let Some(product) = products_store.get::<Product>(&code) {
                    return Some(product);
                }
            }
        }
    }
    None
}

/// Mueve el producto al buffer del pasillo y ordena el dispensado.
async fn dispense(application_state: &AppState, product: &Product, paid_qty: u32) -> u32 {
    // Resolución del pasillo asignado y su contenedor físico
    let aisle_agent = match &product.aisle {
        Some(aisle_agent) => aisle_agent.clone(),
        None => {
            warn!("🧾 [SHOP_MISCONFIG]: Product [{}] has no aisle assigned.", product.code);
            return 0;
        }
    };
    let aisle_container = application_state
        .config
        .shop
        .aisles
        .iter()
        .find(|binding| binding.agent_id == aisle_agent)
        .map(|binding| binding.container.clone());

    let aisle_container = match aisle_container {
        Some(container) => container,
        None => {
            warn!("🧾 [SHOP_MISCONFIG]: Aisle [{}] has no container binding.", aisle_agent);
            return 0;
        }
    };

    let live_stock = {
        let index_guard = application_state
            .index
            .read()
            .expect("LOCK_POISONED: Inventory index");
        index_guard.get_stock(&product.item)
    };
    let dispense_qty = u64::from(paid_qty).min(live_stock) as u32;
    if dispense_qty == 0 {
        return 0;
    }

    let moved = match application_state
        .engine
        .withdraw(
            &application_state.index,
            &product.item,
            dispense_qty,
            &aisle_container,
            None,
        )
        .await
    {
        Ok(summary) => summary.moved.min(u64::from(dispense_qty)) as u32,
        Err(policy_fault) => {
            error!("⛔ [SHOP_DISPENSE]: Withdraw for [{}] refused: {}", product.code, policy_fault);
            0
        }
    };

    // Orden de entrega al agente de pasillo (fire-and-forget)
    if moved > 0 {
        let deliver_order = MessagePayload::Command {
            command: CommandVerb::Deposit,
            command_id: uuid::Uuid::new_v4().to_string(),
            params: serde_json::json!({
                "item": product.item.encoded(),
                "count": moved,
            }),
        };
        if let Err(link_fault) = application_state.bus.send(deliver_order, &aisle_agent).await {
            warn!("💤 [SHOP_DISPENSE]: Deliver order to [{}] not emitted: {}", aisle_agent, link_fault);
        }
    }

    moved
}

/// Sella la venta en los stores de analítica e historia.
fn seal_sale(
    application_state: &AppState,
    record: &TransactionRecord,
    product: &Product,
    qty: u32,
    refunded_value: f64,
    now_ms: u64,
) {
    let sale = SaleRecord {
        transaction_id: record.id.clone(),
        product_code: product.code.clone(),
        qty,
        unit_price: product.price,
        gross_value: record.value,
        refunded_value: refunded_value.max(0.0),
        buyer: record.from.clone(),
        sealed_at_ms: now_ms,
    };

    if let Ok(sales_store) = application_state.stores.store(names::SALES) {
        let _ = sales_store.set(&record.id, &sale);
    }
    if let Ok(history_store) = application_state.stores.store(names::HISTORY) {
        let history_key = format!("{:016}-{}", now_ms, record.id);
        let _ = history_store.set(&history_key, &sale);
    }
}

// --- GESTIÓN DE CATÁLOGO (ACCIONES DE OPERADOR) ---

/**
 * Alta de producto con guardia de ambigüedad: si el base-id resuelve
 * a más de una variante NBT en stock y el producto no fija huella,
 * se rechaza y se exige precisión del operador (jamás se adivina).
 */
pub fn create_product(application_state: &AppState, product: Product) -> Result<(), BoundaryFault> {
    if product.code.trim().is_empty() {
        return Err(BoundaryFault::InvalidRequest("product code is empty".into()));
    }

    if product.item.nbt_hash.is_none() {
        let stocked_variants = {
            let index_guard = application_state
                .index
                .read()
                .expect("LOCK_POISONED: Inventory index");
            index_guard.keys_for_base(&product.item.base_id).len()
        };
        if stocked_variants > 1 {
            return Err(BoundaryFault::InvalidRequest(format!(
                "ambiguous item [{}]: {} stocked NBT variants, operator must pin one",
                product.item.base_id, stocked_variants
            )));
        }
    }

    let products_store = application_state
        .stores
        .store(names::PRODUCTS)
        .map_err(|store_fault| BoundaryFault::InvalidRequest(store_fault.to_string()))?;

    let is_update = products_store.contains(&product.code);
    products_store
        .set(&product.code, &product)
        .map_err(|store_fault| BoundaryFault::InvalidRequest(store_fault.to_string()))?;

    let event = if is_update {
        CoordinatorEvent::ProductUpdate {
            product_code: product.code.clone(),
        }
    } else {
        CoordinatorEvent::ProductCreate {
            product_code: product.code.clone(),
        }
    };
    application_state.events.publish(event);
    Ok(())
}

/// Baja de producto del catálogo.
pub fn delete_product(application_state: &AppState, product_code: &str) -> Result<(), BoundaryFault> {
    let products_store = application_state
        .stores
        .store(names::PRODUCTS)
        .map_err(|store_fault| BoundaryFault::InvalidRequest(store_fault.to_string()))?;
    products_store
        .remove(product_code)
        .map_err(|store_fault| BoundaryFault::InvalidRequest(store_fault.to_string()))?;

    application_state.events.publish(CoordinatorEvent::ProductDelete {
        product_code: product_code.to_string(),
    });
    Ok(())
}

/// Deshace la última entrada del feed de historia (acción de operador).
pub fn undo_last_history_entry(application_state: &AppState) -> Option<String> {
    let history_store = application_state.stores.store(names::HISTORY).ok()?;
    let last_key = history_store.keys().into_iter().next_back()?;
    history_store.remove(&last_key).ok()?;

    application_state.events.publish(CoordinatorEvent::HistoryUndo {
        entry_key: last_key.clone(),
    });
    Some(last_key)
}

// --- ADVERTS DE DESCUBRIMIENTO ---

/// Inicia el daemon de adverts SHOPSYNC con stock vivo.
pub async fn spawn_shopsync_daemon(application_state: AppState) {
    let mut advert_ticker = interval(Duration::from_secs(SHOPSYNC_ADVERT_INTERVAL_SECONDS));
    advert_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::spawn(async move {
        info!("📢 [SHOPSYNC]: Discovery advert daemon active.");
        loop {
            advert_ticker.tick().await;

            let catalogue: Vec<ShopAdvertItem> = match application_state.stores.store(names::PRODUCTS) {
                Ok(products_store) => {
                    let index_guard = application_state
                        .index
                        .read()
                        .expect("LOCK_POISONED: Inventory index");
                    products_store
                        .keys()
                        .into_iter()
                        .filter_map(|code| products_store.get::<Product>(&code))
                        .map(|product| ShopAdvertItem {
                            stock: index_guard.get_stock(&product.item),
                            item: product.item,
                            display_name: product.display_name,
                            price: product.price,
                        })
                        .collect()
                }
                Err(_) => Vec::new(),
            };

            if catalogue.is_empty() {
                continue;
            }

            let advert = MessagePayload::ShopSync {
                info: ShopAdvertInfo {
                    name: application_state.config.shop.advert_name.clone(),
                    owner: application_state.config.label.clone(),
                },
                items: catalogue,
            };
            if let Err(link_fault) = application_state.bus.broadcast(advert).await {
                warn!("💤 [SHOPSYNC]: Advert not emitted: {}", link_fault);
            }
        }
    });
}
