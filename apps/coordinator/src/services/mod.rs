// [apps/coordinator/src/services/mod.rs]
/**
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V21.0 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la central de registro de la inteligencia del sistema.
 * 1. MODULARIDAD: Cada servicio opera como una unidad atómica aislada.
 * 2. TICK DISCIPLINE: Todos los bucles periódicos usan
 *    MissedTickBehavior::Skip; un tick lento jamás acumula ráfagas.
 * =================================================================
 */

pub mod bus_pump;
pub mod dispatcher;
pub mod export_engine;
pub mod fleet_command;
pub mod furnace_daemon;
pub mod health_sweep;
pub mod heartbeat;
pub mod monitor_refresh;
pub mod request_progress;
pub mod scan_daemon;
pub mod shop_gateway;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use bus_pump::{register_protocol_handlers, spawn_bus_pump};
pub use dispatcher::{execute_dispatch_pass, spawn_dispatcher};
pub use export_engine::{execute_export_tick, spawn_export_daemon};
pub use fleet_command::issue_command;
pub use furnace_daemon::{execute_furnace_tick, spawn_furnace_daemon};
pub use health_sweep::{execute_sweep_pass, spawn_health_sweep};
pub use heartbeat::spawn_heartbeat_daemon;
pub use monitor_refresh::spawn_monitor_refresh;
pub use request_progress::{execute_progress_pass, spawn_request_progress};
pub use scan_daemon::{execute_scan, spawn_scan_daemon};
pub use shop_gateway::{spawn_shop_gateway, spawn_shopsync_daemon, LoggingRefundSink, RefundSink};
