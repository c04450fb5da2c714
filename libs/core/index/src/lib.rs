// [libs/core/index/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INVENTORY INDEX HUB (V15.0 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE STATE MODEL (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL ÍNDICE DE INVENTARIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. CACHE-PLUS-GROUND-TRUTH: El índice es una caché rápida; los
 *    scans periódicos son la fuente de verdad. Nunca se optimizan
 *    los scans hasta desaparecer.
 * 2. PURE STRUCTURE: El índice es síncrono y puro; el estrato de
 *    aplicación lo guarda bajo RwLock y aplica el patrón canónico
 *    plan-bajo-cerrojo / ejecutar / re-aplicar deltas.
 * =================================================================
 */

pub mod index;

pub use index::{ContainerEntry, InventoryIndex, Location};
