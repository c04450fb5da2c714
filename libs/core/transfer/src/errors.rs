// [libs/core/transfer/src/errors.rs]
//! =================================================================
//! APARATO: TRANSFER ENGINE ERRORS (V16.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE POLÍTICA DE MOVIMIENTO
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferFault {
    /// El destino no es un ExportTarget configurado: el motor se niega
    /// a empujar ítems hacia contenedores ambientales no gobernados.
    #[error("FORBIDDEN_DESTINATION: [{container}] is not a configured export target")]
    ForbiddenDestination { container: String },

    /// Se solicitaron `requested` unidades pero solo `moved` cruzaron.
    #[error("INSUFFICIENT_STOCK: Requested {requested}, moved {moved}")]
    InsufficientStock { requested: u64, moved: u64 },
}
