// [libs/infra/bus/src/errors.rs]
//! =================================================================
//! APARATO: MESSAGE BUS ERRORS (V18.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DEL ENLACE INALÁMBRICO
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BusFault {
    #[error("LINK_FAULT: Physical link I/O collapsed: {0}")]
    LinkIo(#[from] std::io::Error),

    #[error("LINK_CLOSED: The inbound channel has been sealed")]
    LinkClosed,

    #[error("ENVELOPE_ENCODE_FAULT: {0}")]
    EncodeFault(#[from] rmp_serde::encode::Error),

    /// Sobre irreconocible o esquema desfasado. Se registra y el
    /// emisor PUEDE reintentar; jamás es fatal para la bomba.
    #[error("PROTOCOL_ERROR: Unrecognised envelope: {0}")]
    ProtocolError(#[from] rmp_serde::decode::Error),
}
