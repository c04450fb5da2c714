// [apps/coordinator/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V21.5 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE ESTRATOS DEL COORDINADOR
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza índice, motor, registro de
 *    agentes, cola, libro mayor, bus, stores y canal de eventos.
 * 2. LOCK DISCIPLINE: El índice vive bajo RwLock y la cola/libro
 *    bajo Mutex; ningún guard cruza un punto de suspensión (patrón
 *    canónico plan/ejecutar/re-aplicar).
 * 3. DURABILITY SPLIT: La caché del índice se reconstruye de la
 *    realidad; solo jobs, metas y radar de agentes son durables.
 * =================================================================
 */

pub mod agent_registry;
pub mod command_tracker;
pub mod event_channel;

use crate::config::CoordinatorConfig;
use crate::errors::BoundaryFault;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use telar_core_index::InventoryIndex;
use telar_core_planner::{JobQueue, LedgerSnapshot, QueueSnapshot, RequestLedger, RequestPlanner};
use telar_core_transfer::TransferEngine;
use telar_domain_models::{ItemKey, RecipeBook, Request, TransactionRecord};
use telar_infra_bus::{BusLink, MessageBus};
use telar_infra_driver::FabricDriver;
use telar_infra_store::{names, StoreHub};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use agent_registry::AgentRegistry;
pub use command_tracker::CommandTracker;
pub use event_channel::{CoordinatorEvent, EventChannel};

/// Clave única de los snapshots durables dentro de su store.
const DURABLE_SNAPSHOT_KEY: &str = "snapshot";

/// Capacidad del buzón de transacciones de la pasarela externa.
const TRANSACTION_INLET_CAPACITY: usize = 64;

/**
 * Contenedor de estado compartido (Thread-Safe) del coordinador.
 * Actúa como la placa base donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Configuración inmutable cargada en la ignición.
    pub config: Arc<CoordinatorConfig>,
    /// Vista cacheada del tejido (única estructura contendida).
    pub index: Arc<RwLock<InventoryIndex>>,
    /// Motor de transferencias con guardia de exportación.
    pub engine: Arc<TransferEngine>,
    /// Frontera física del tejido.
    pub driver: Arc<dyn FabricDriver>,
    /// Bus inalámbrico hacia los agentes remotos.
    pub bus: Arc<MessageBus>,
    /// Radar de agentes y salud derivada.
    pub registry: Arc<AgentRegistry>,
    /// Cola FIFO soberana de jobs.
    pub queue: Arc<Mutex<JobQueue>>,
    /// Planificador recursivo de materiales.
    pub planner: Arc<RequestPlanner>,
    /// Libro mayor de metas de usuario.
    pub ledger: Arc<Mutex<RequestLedger>>,
    /// Biblioteca inmutable de recetas del sitio.
    pub recipes: Arc<RecipeBook>,
    /// Canal de eventos observables en proceso.
    pub events: EventChannel,
    /// Familia de stores persistentes.
    pub stores: Arc<StoreHub>,
    /// Pizarra de déficits delegados al orquestador de fundición.
    pub smelt_board: Arc<Mutex<HashMap<ItemKey, u32>>>,
    /// Buzón de ingreso del flujo de transacciones externo.
    pub transaction_inlet: mpsc::Sender<TransactionRecord>,
    /// Correlación de mandos de flota en vuelo (ACK/ERROR).
    pub commands: Arc<CommandTracker>,
    /// Señal de rescan forzado (violación de invariante detectada).
    forced_rescan: Arc<AtomicBool>,
}

impl AppState {
    /**
     * Forja el estado maestro inyectando todas las dependencias y
     * rehidratando el estado durable (cola y libro mayor).
     *
     * Retorna además el receptor del buzón de transacciones que la
     * pasarela de tienda consumirá.
     */
    pub fn new(
        config: Arc<CoordinatorConfig>,
        driver: Arc<dyn FabricDriver>,
        link: Arc<dyn BusLink>,
        recipes: RecipeBook,
    ) -> anyhow::Result<(Self, mpsc::Receiver<TransactionRecord>)> {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence V21.5...");

        let export_destinations = config
            .export_targets
            .iter()
            .map(|target| target.container.clone())
            .collect();

        let stores = Arc::new(StoreHub::new(config.data_root.clone()));

        // Rehidratación durable: cola de jobs
        let mut queue = JobQueue::new();
        if let Ok(queue_store) = stores.store(names::QUEUE) {
            if let Some(snapshot) = queue_store.get::<QueueSnapshot>(DURABLE_SNAPSHOT_KEY) {
                info!("💾 [APP_STATE]: Queue rehydrated ({} pending, {} active).",
                    snapshot.pending.len(), snapshot.active.len());
                queue.restore(snapshot);
            }
        }

        // Rehidratación durable: libro mayor de metas
        let mut ledger = RequestLedger::new();
        if let Ok(requests_store) = stores.store(names::REQUESTS) {
            if let Some(snapshot) = requests_store.get::<LedgerSnapshot>(DURABLE_SNAPSHOT_KEY) {
                info!("💾 [APP_STATE]: Request ledger rehydrated ({} requests).",
                    snapshot.requests.len());
                ledger.restore(snapshot);
            }
        }

        let bus = Arc::new(MessageBus::new(
            config.identity.clone(),
            config.label.clone(),
            link,
        ));

        let (transaction_inlet, transaction_outlet) =
            mpsc::channel::<TransactionRecord>(TRANSACTION_INLET_CAPACITY);

        let state = Self {
            index: Arc::new(RwLock::new(InventoryIndex::new())),
            engine: Arc::new(TransferEngine::new(Arc::clone(&driver), export_destinations)),
            driver,
            bus,
            registry: Arc::new(AgentRegistry::new(
                config.health.degraded_after_ms,
                config.health.offline_after_ms,
            )),
            queue: Arc::new(Mutex::new(queue)),
            planner: Arc::new(RequestPlanner::new()),
            ledger: Arc::new(Mutex::new(ledger)),
            recipes: Arc::new(recipes),
            events: EventChannel::new(),
            stores,
            smelt_board: Arc::new(Mutex::new(HashMap::new())),
            transaction_inlet,
            commands: Arc::new(CommandTracker::new()),
            forced_rescan: Arc::new(AtomicBool::new(false)),
            config,
        };

        Ok((state, transaction_outlet))
    }

    /// Reloj del coordinador en milisegundos unix.
    pub fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }

    // --- FRONTERA PÚBLICA DE METAS ---

    /**
     * Crea una meta de usuario validando la entrada en la frontera.
     *
     * # Errors:
     * - `InvalidRequest`: cantidad nula o identidad vacía.
     */
    pub fn submit_request(
        &self,
        item: ItemKey,
        qty: u32,
        deliver_to: Option<String>,
    ) -> Result<Request, BoundaryFault> {
        if qty == 0 {
            return Err(BoundaryFault::InvalidRequest("qty must be positive".into()));
        }
        if item.base_id.trim().is_empty() {
            return Err(BoundaryFault::InvalidRequest("item base-id is empty".into()));
        }

        let is_smelt = self.recipes.craft_recipe(&item.base_id).is_none()
            && self.recipes.is_smeltable(&item.base_id);

        let now_ms = self.now_ms();
        let mut ledger_guard = self.ledger.lock().expect("LOCK_POISONED: Request ledger");
        Ok(ledger_guard.create(item, qty, deliver_to, is_smelt, now_ms))
    }

    // --- PIZARRA DE FUNDICIÓN ---

    /// Acumula un déficit delegado por el planificador.
    pub fn note_smelt_need(&self, item: ItemKey, qty: u32) {
        let mut board_guard = self.smelt_board.lock().expect("LOCK_POISONED: Smelt board");
        *board_guard.entry(item).or_insert(0) += qty;
    }

    /// Consume hasta `served` unidades de un déficit programado.
    pub fn settle_smelt_need(&self, item: &ItemKey, served: u32) {
        let mut board_guard = self.smelt_board.lock().expect("LOCK_POISONED: Smelt board");
        if let Some(outstanding) = board_guard.get_mut(item) {
            *outstanding = outstanding.saturating_sub(served);
            if *outstanding == 0 {
                board_guard.remove(item);
            }
        }
    }

    /// Instantánea de la pizarra para el tick del horno.
    pub fn smelt_board_snapshot(&self) -> Vec<(ItemKey, u32)> {
        let board_guard = self.smelt_board.lock().expect("LOCK_POISONED: Smelt board");
        board_guard
            .iter()
            .map(|(item, qty)| (item.clone(), *qty))
            .collect()
    }

    // --- SEÑAL DE RESCAN FORZADO ---

    /// Dispara un rescan autoritativo en el siguiente ciclo de scan.
    pub fn trigger_forced_rescan(&self, diagnostic: &str) {
        warn!("🚨 [STATE_ALERT]: Forced rescan armed: {}", diagnostic);
        self.forced_rescan.store(true, Ordering::SeqCst);
    }

    /// Consume la señal (true si estaba armada).
    pub fn consume_forced_rescan(&self) -> bool {
        self.forced_rescan.swap(false, Ordering::SeqCst)
    }

    // --- DURABILIDAD COALESCIDA ---

    /**
     * Persiste cola, libro mayor, historia terminal y radar de
     * agentes en sus stores. Las escrituras multi-campo van en
     * sesión batch para colapsar en un volcado por archivo.
     */
    pub fn persist_durable_state(&self) -> anyhow::Result<()> {
        let queue_snapshot = {
            let queue_guard = self.queue.lock().expect("LOCK_POISONED: Job queue");
            queue_guard.snapshot()
        };
        let (completed, failed) = {
            let queue_guard = self.queue.lock().expect("LOCK_POISONED: Job queue");
            (
                queue_guard.completed_history().cloned().collect::<Vec<_>>(),
                queue_guard.failed_history().cloned().collect::<Vec<_>>(),
            )
        };
        let ledger_snapshot = {
            let ledger_guard = self.ledger.lock().expect("LOCK_POISONED: Request ledger");
            ledger_guard.snapshot()
        };

        let queue_store = self.stores.store(names::QUEUE)?;
        queue_store.set(DURABLE_SNAPSHOT_KEY, &queue_snapshot)?;

        let history_store = self.stores.store(names::JOB_HISTORY)?;
        history_store.begin_batch();
        history_store.set("completed", &completed)?;
        history_store.set("failed", &failed)?;
        history_store.end_batch()?;

        let requests_store = self.stores.store(names::REQUESTS)?;
        requests_store.set(DURABLE_SNAPSHOT_KEY, &ledger_snapshot)?;

        let crafters_store = self.stores.store(names::CRAFTERS)?;
        crafters_store.set(
            DURABLE_SNAPSHOT_KEY,
            &self.registry.snapshot_of_kind(telar_domain_models::AgentKind::Crafter),
        )?;

        let aisles_store = self.stores.store(names::AISLES)?;
        aisles_store.set(
            DURABLE_SNAPSHOT_KEY,
            &self.registry.snapshot_of_kind(telar_domain_models::AgentKind::Aisle),
        )?;

        Ok(())
    }
}
