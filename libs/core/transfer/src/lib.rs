// [libs/core/transfer/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TRANSFER ENGINE HUB (V16.0 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL MOTOR DE TRANSFERENCIAS
 * =================================================================
 */

pub mod engine;
pub mod errors;
pub mod plan;

pub use engine::TransferEngine;
pub use errors::TransferFault;
pub use plan::{build_transfer_plan, SourceStack, TransferSummary, TransferTask};
