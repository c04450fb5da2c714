// [libs/infra/driver/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CONTAINER DRIVER BOUNDARY (V14.0 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: CONTRATO DEL MECANISMO FÍSICO DE TRANSFERENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PLUGGABLE SEAM: El núcleo jamás posee el mecanismo físico; lo
 *    comanda a través de este contrato. Reemplazable para tests,
 *    para otro anfitrión o para simulación.
 * 2. BEST-EFFORT ATOMICITY: push/pull mueven 'transferred' ítems o
 *    ninguno de esos ítems específicos; 0 es un resultado legal.
 * 3. CONCURRENCY CONTRACT: Invocaciones concurrentes sobre pares
 *    (contenedor, ranura) disjuntos son seguras; sobre la misma
 *    ranura se serializan internamente.
 * =================================================================
 */

pub mod errors;
pub mod sim;

pub use errors::DriverFault;
pub use sim::{SimContainer, SimulatedFabric};

use async_trait::async_trait;
use telar_domain_models::{SlotDetail, SlotMap};

/// Contrato de capacidades que el anfitrión provee para cada
/// contenedor nombrado del tejido.
#[async_trait]
pub trait FabricDriver: Send + Sync {
    /// Enumera los contenedores actualmente alcanzables en el tejido.
    async fn discover(&self) -> Result<Vec<String>, DriverFault>;

    /// Instantánea dispersa ranura -> {identidad, conteo}.
    async fn list(&self, container: &str) -> Result<SlotMap, DriverFault>;

    /// Detalle enriquecido de una ranura; None si está vacía.
    async fn detail(&self, container: &str, slot: u32) -> Result<Option<SlotDetail>, DriverFault>;

    /// Capacidad total en ranuras del contenedor.
    async fn size(&self, container: &str) -> Result<u32, DriverFault>;

    /**
     * Mueve hasta `amount` ítems desde (source, source_slot) hacia
     * `destination`, retornando la cantidad realmente transferida.
     * El retorno es el conteo autoritativo; 0 es legal.
     */
    async fn push(
        &self,
        source: &str,
        source_slot: u32,
        destination: &str,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, DriverFault>;

    /**
     * Dual de `push`: extrae hasta `amount` ítems de
     * (source, source_slot) hacia `destination`.
     */
    async fn pull(
        &self,
        destination: &str,
        source: &str,
        source_slot: u32,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, DriverFault>;
}
