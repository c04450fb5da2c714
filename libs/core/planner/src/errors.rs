// [libs/core/planner/src/errors.rs]
//! =================================================================
//! APARATO: PLANNER & QUEUE ERRORS (V17.0 - FABRIC GOLD)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE PLANIFICACIÓN
//! =================================================================

use telar_domain_models::{ItemKey, JobStatus, MissingMaterial};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueFault {
    #[error("NO_RECIPE: No craft definition for [{item}]")]
    NoRecipe { item: ItemKey },

    /// La receta existe pero los insumos no alcanzan; porta la lista
    /// estructurada (item, needed, have) para el ciclo de reintento.
    #[error("MISSING_MATERIALS: {} inputs short", missing.len())]
    MissingMaterials { missing: Vec<MissingMaterial> },

    #[error("UNKNOWN_JOB: Job {job_id} is not tracked")]
    UnknownJob { job_id: u64 },

    #[error("INVALID_TRANSITION: Job {job_id} cannot move {from:?} -> {to:?}")]
    InvalidTransition {
        job_id: u64,
        from: JobStatus,
        to: JobStatus,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanFault {
    /// Guardia de recursión: la cadena de sub-recetas excede el límite.
    #[error("MAX_DEPTH_EXCEEDED: Recursion beyond {max_depth} levels")]
    MaxDepthExceeded { max_depth: u32 },

    /// El grafo de recetas contiene un ciclo; se detecta, no se tolera.
    #[error("CYCLE_DETECTED: [{item}] depends on itself")]
    CycleDetected { item: ItemKey },

    #[error("NO_RECIPE: No craft or smelt definition for [{item}]")]
    NoRecipe { item: ItemKey },
}
