// [libs/core/planner/src/lib.rs]
/*!
 * =================================================================
 * APARATO: REQUEST PLANNER HUB (V17.0 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL PLANIFICADOR Y LA COLA
 * =================================================================
 */

pub mod errors;
pub mod planner;
pub mod queue;
pub mod requests;

pub use errors::{PlanFault, QueueFault};
pub use planner::{PlanOutcome, RequestPlanner};
pub use queue::{JobQueue, QueueSnapshot};
pub use requests::{LedgerSnapshot, RequestLedger};
