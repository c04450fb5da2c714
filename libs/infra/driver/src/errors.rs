// [libs/infra/driver/src/errors.rs]
//! =================================================================
//! APARATO: DRIVER BOUNDARY ERRORS (V14.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DEL MECANISMO FÍSICO
//! =================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverFault {
    /// El contenedor no respondió (desapareció del tejido o latencia).
    #[error("DRIVER_UNAVAILABLE: Container [{container}] did not respond")]
    Unavailable { container: String },

    /// La ranura objetivo está protegida por el anfitrión.
    #[error("DRIVER_BLOCKED: Slot {slot} of [{container}] is protected")]
    Blocked { container: String, slot: u32 },
}

impl DriverFault {
    pub fn unavailable(container: impl Into<String>) -> Self {
        Self::Unavailable {
            container: container.into(),
        }
    }

    pub fn blocked(container: impl Into<String>, slot: u32) -> Self {
        Self::Blocked {
            container: container.into(),
            slot,
        }
    }
}
