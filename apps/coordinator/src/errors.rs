// [apps/coordinator/src/errors.rs]
//! =================================================================
//! APARATO: COORDINATOR BOUNDARY ERRORS (V21.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE AGENTES Y FRONTERA
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentFault {
    #[error("AGENT_NOT_FOUND: [{agent}] is not registered in the grid")]
    AgentNotFound { agent: String },

    #[error("AGENT_OFFLINE: [{agent}] has no recent heartbeat")]
    AgentOffline { agent: String },

    #[error("AGENT_BUSY: [{agent}] is executing another job")]
    AgentBusy { agent: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundaryFault {
    /// Entrada de usuario malformada en la frontera pública.
    #[error("INVALID_REQUEST: {0}")]
    InvalidRequest(String),
}
