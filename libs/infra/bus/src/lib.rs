// [libs/infra/bus/src/lib.rs]
/*!
 * =================================================================
 * APARATO: MESSAGE BUS HUB (V18.0 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL BUS INALÁMBRICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. AT-LEAST-ONCE: El canal es no confiable y sin orden entre
 *    emisores; los consumidores son idempotentes por contrato.
 * 2. PLUGGABLE LINK: El enlace físico (UDP broadcast, loopback de
 *    Proving Grounds) se inyecta como seam dyn-compatible.
 * =================================================================
 */

pub mod bus;
pub mod errors;
pub mod link;

pub use bus::{BusHandler, MessageBus};
pub use errors::BusFault;
pub use link::{BusLink, LoopbackLink, UdpBroadcastLink};
