// [libs/infra/store/src/errors.rs]
//! =================================================================
//! APARATO: RECORD STORE ERRORS (V19.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE PERSISTENCIA LOCAL
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreFault {
    #[error("IO_VAULT_FAULT: Disk access denied or full: {0}")]
    IoFault(#[from] std::io::Error),

    #[error("DOCUMENT_CORRUPTION: Failed to encode or decode store document: {0}")]
    DocumentFault(#[from] serde_json::Error),
}
