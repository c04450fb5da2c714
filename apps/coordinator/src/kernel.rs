// [apps/coordinator/src/kernel.rs]
/**
 * =================================================================
 * APARATO: COORDINATOR SOVEREIGN KERNEL (V22.0 - FABRIC GOLD)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * scan autoritativo, motor de exportación, orquestador de fundición,
 * pulso de latidos, barrido de salud, despachador, bucle de metas,
 * pasarela de tienda y bomba del protocolo.
 * =================================================================
 */

use crate::config::CoordinatorConfig;
use crate::services::{
    spawn_bus_pump, spawn_dispatcher, spawn_export_daemon, spawn_furnace_daemon,
    spawn_health_sweep, spawn_heartbeat_daemon, spawn_monitor_refresh, spawn_request_progress,
    spawn_scan_daemon, spawn_shop_gateway, spawn_shopsync_daemon, LoggingRefundSink,
};
use crate::state::AppState;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use telar_domain_models::{ItemKey, TransactionRecord};
use telar_infra_bus::UdpBroadcastLink;
use telar_infra_driver::{FabricDriver, SimulatedFabric};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Ranura poblada de un documento de mundo simulado.
#[derive(Debug, Deserialize)]
struct WorldSlotSpec {
    item: ItemKey,
    count: u32,
}

/// Contenedor de un documento de mundo simulado.
#[derive(Debug, Deserialize)]
struct WorldContainerSpec {
    name: String,
    size: u32,
    #[serde(default)]
    slots: BTreeMap<u32, WorldSlotSpec>,
}

pub struct CoordinatorKernel {
    application_state: AppState,
    transaction_outlet: mpsc::Receiver<TransactionRecord>,
}

impl CoordinatorKernel {
    /**
     * Realiza la ignición del driver, el enlace del bus y el estado
     * neural. Establece la frontera física antes de levantar servicios.
     */
    pub async fn ignite(config: CoordinatorConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        // 1. FRONTERA FÍSICA: driver de simulación hidratado del mundo
        let driver: Arc<dyn FabricDriver> = Arc::new(Self::materialize_world(&config)?);

        // 2. ENLACE DEL CANAL INALÁMBRICO
        let link = Arc::new(UdpBroadcastLink::bind(config.bus.channel_port).await?);

        // 3. BIBLIOTECA DE RECETAS DEL SITIO
        let recipes = config.load_recipe_book()?;

        let (application_state, transaction_outlet) =
            AppState::new(config, driver, link, recipes)?;

        Ok(Self {
            application_state,
            transaction_outlet,
        })
    }

    /// Hidrata el tejido simulado desde el documento de mundo.
    fn materialize_world(config: &CoordinatorConfig) -> anyhow::Result<SimulatedFabric> {
        let fabric = SimulatedFabric::new();

        if let Some(world_path) = &config.world_path {
            let raw_document = std::fs::read_to_string(world_path)?;
            let world: Vec<WorldContainerSpec> = serde_json::from_str(&raw_document)?;

            for container_spec in world {
                fabric.add_container(&container_spec.name, container_spec.size);
                for (slot, slot_spec) in container_spec.slots {
                    fabric.seed_slot(&container_spec.name, slot, slot_spec.item, slot_spec.count);
                }
            }
            info!("🌍 [KERNEL]: Simulated fabric materialized from {}.", world_path.display());
        } else {
            warn!("🌍 [KERNEL]: No world document configured. Fabric starts empty.");
        }

        Ok(fabric)
    }

    /**
     * Lanza la ejecución de todas las operaciones autónomas del
     * tejido y bloquea hasta la señal de terminación del anfitrión.
     */
    pub async fn launch_sovereign_operations(self) -> anyhow::Result<()> {
        let shared_application_state = self.application_state;

        // --- 1. SCAN INICIAL AUTORITATIVO (GROUND TRUTH) ---
        match crate::services::execute_scan(&shared_application_state, true).await {
            Ok(report) => info!("🔍 [KERNEL]: Initial scan sealed: {} containers observed.",
                report.observed),
            Err(scan_fault) => warn!("⚠️ [KERNEL]: Initial scan degraded: {}", scan_fault),
        }

        // --- 2. BOMBA DEL PROTOCOLO Y PULSO DE LATIDOS ---
        spawn_bus_pump(shared_application_state.clone()).await;
        spawn_heartbeat_daemon(shared_application_state.clone()).await;

        // --- 3. DAEMONS DE MANTENIMIENTO DEL ÍNDICE ---
        spawn_scan_daemon(shared_application_state.clone()).await;
        spawn_health_sweep(shared_application_state.clone()).await;
        spawn_monitor_refresh(shared_application_state.clone()).await;

        // --- 4. MOTORES DE POLÍTICA Y PLANIFICACIÓN ---
        spawn_export_daemon(shared_application_state.clone()).await;
        spawn_furnace_daemon(shared_application_state.clone()).await;
        spawn_dispatcher(shared_application_state.clone()).await;
        spawn_request_progress(shared_application_state.clone()).await;

        // --- 5. PRODUCTO DE TIENDA (OPCIONAL POR CONFIGURACIÓN) ---
        if shared_application_state.config.shop.enabled {
            spawn_shop_gateway(
                shared_application_state.clone(),
                self.transaction_outlet,
                Arc::new(LoggingRefundSink),
            )
            .await;
            spawn_shopsync_daemon(shared_application_state.clone()).await;
        }

        info!("🚀 [KERNEL_ONLINE]: Sovereign fabric coordinator operational as [{}].",
            shared_application_state.config.identity);

        // --- 6. CIERRE DETERMINISTA ---
        tokio::signal::ctrl_c().await?;
        warn!("⚠️ [SIGNAL]: Termination requested by host. Sealing durable strata...");

        if let Err(persist_fault) = shared_application_state.persist_durable_state() {
            error!("💀 [KERNEL_SEAL_FAULT]: Durable state flush failed: {}", persist_fault);
        }

        info!("🏁 [KERNEL_OFFLINE]: Coordinator sealed. Goodbye.");
        Ok(())
    }

    /// Acceso al estado para orquestaciones embebidas y Proving Grounds.
    pub fn state(&self) -> &AppState {
        &self.application_state
    }
}
