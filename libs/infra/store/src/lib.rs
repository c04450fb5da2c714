// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: RECORD STORE HUB (V19.0 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA OPACA CLAVE -> JSON POR NOMBRE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NOT-FOR-CORRECTNESS: La caché del índice se reconstruye desde
 *    la realidad en cada arranque; los stores existen para la
 *    durabilidad de requests/jobs y la analítica de ventas.
 * 2. ATOMIC OVERWRITE: Escritura a archivo temporal + rename;
 *    jamás un estado a medio escribir en disco.
 * =================================================================
 */

pub mod errors;
pub mod store;

pub use errors::StoreFault;
pub use store::{RecordStore, StoreHub};

/// Nombres estables de la familia de stores del coordinador.
pub mod names {
    pub const CRAFTERS: &str = "crafters";
    pub const QUEUE: &str = "queue";
    pub const JOB_HISTORY: &str = "job-history";
    pub const REQUESTS: &str = "requests";
    pub const AISLES: &str = "aisles";
    pub const STOCK_CACHE: &str = "stock-cache";
    pub const DETAIL_CACHE: &str = "detail-cache";
    pub const PRODUCTS: &str = "products";
    pub const SALES: &str = "sales";
    pub const HISTORY: &str = "history";
    pub const PENDING_REFUNDS: &str = "pending-refunds";
}
