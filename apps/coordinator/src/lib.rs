// [apps/coordinator/src/lib.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR LIBRARY SURFACE (V21.0 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE MÓDULOS PARA TESTS Y BINARIO
 * =================================================================
 */

pub mod config;
pub mod errors;
pub mod kernel;
pub mod services;
pub mod state;
