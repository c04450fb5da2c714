// [apps/coordinator/src/state/agent_registry.rs]
/*!
 * =================================================================
 * APARATO: AGENT REGISTRY & GRID RADAR (V21.3 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: VIGILANCIA DE AGENTES REMOTOS Y SALUD DERIVADA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. AUTO-REGISTRATION: Un latido de un id desconocido registra al
 *    agente con capacidades VACÍAS; el despachador jamás enviará
 *    trabajo tipado a quien no reclamó la capacidad.
 * 2. TRANSITION MEMORY: El barrido de salud recuerda el último
 *    veredicto por agente y emite cambios SOLO en transiciones.
 * 3. DETERMINISTIC SELECTION: getIdle recorre ids ascendentes para
 *    un despacho reproducible.
 * =================================================================
 */

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use telar_domain_models::{AgentHealth, AgentKind, AgentRecord, AgentStatus};
use tracing::{debug, info, warn};

/// Centro de vigilancia de la rejilla de agentes.
pub struct AgentRegistry {
    records: RwLock<HashMap<String, AgentRecord>>,
    /// Último veredicto de salud observado por el barrido.
    last_health: RwLock<HashMap<String, AgentHealth>>,
    degraded_after_ms: u64,
    offline_after_ms: u64,
}

impl AgentRegistry {
    pub fn new(degraded_after_ms: u64, offline_after_ms: u64) -> Self {
        Self {
            records: RwLock::new(HashMap::with_capacity(64)),
            last_health: RwLock::new(HashMap::with_capacity(64)),
            degraded_after_ms,
            offline_after_ms,
        }
    }

    // --- ESTRATO DE REGISTRO ---

    /// Registro explícito (acción de operador o handshake enriquecido).
    pub fn register(
        &self,
        agent_id: &str,
        kind: AgentKind,
        label: Option<String>,
        capabilities: BTreeSet<String>,
        now_ms: u64,
    ) {
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        info!("🛰️ [REGISTRY_ENROLL]: Agent [{}] enrolled as {:?}.", agent_id, kind);
        records_guard.insert(
            agent_id.to_string(),
            AgentRecord {
                id: agent_id.to_string(),
                kind,
                label,
                capabilities,
                status: AgentStatus::Idle,
                last_seen_ms: now_ms,
                current_job: None,
            },
        );
    }

    /**
     * Garantiza la existencia del agente (auto-registro implícito por
     * latido). Las capacidades arrancan vacías por contrato.
     */
    pub fn ensure_registered(&self, agent_id: &str, kind_hint: AgentKind, now_ms: u64) {
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        records_guard.entry(agent_id.to_string()).or_insert_with(|| {
            info!("🛰️ [REGISTRY_AUTO]: Unknown heartbeat [{}] auto-registered as {:?} (no capabilities).",
                agent_id, kind_hint);
            AgentRecord {
                id: agent_id.to_string(),
                kind: kind_hint,
                label: None,
                capabilities: BTreeSet::new(),
                status: AgentStatus::Idle,
                last_seen_ms: now_ms,
                current_job: None,
            }
        });
    }

    /// Acción de operador: asignación de capacidades reclamadas.
    pub fn set_capabilities(&self, agent_id: &str, capabilities: BTreeSet<String>) {
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        if let Some(record) = records_guard.get_mut(agent_id) {
            record.capabilities = capabilities;
        }
    }

    /// Baja definitiva decidida por el operador.
    pub fn remove(&self, agent_id: &str) {
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        if records_guard.remove(agent_id).is_some() {
            warn!("🗑️ [REGISTRY_EVICT]: Agent [{}] removed from the grid.", agent_id);
        }
        let mut health_guard = self.last_health.write().expect("LOCK_POISONED: Health memory");
        health_guard.remove(agent_id);
    }

    // --- ESTRATO DE TELEMETRÍA ---

    /// Sincroniza el estado auto-reportado de un agente conocido o no.
    pub fn update_status(
        &self,
        agent_id: &str,
        kind_hint: AgentKind,
        status: AgentStatus,
        current_job: Option<u64>,
        now_ms: u64,
    ) {
        self.ensure_registered(agent_id, kind_hint, now_ms);
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        if let Some(record) = records_guard.get_mut(agent_id) {
            debug!("📡 [REGISTRY_SYNC]: Pulse for [{}]: {:?} (job {:?}).",
                agent_id, status, current_job);
            record.status = status;
            record.current_job = current_job;
            record.last_seen_ms = now_ms;
        }
    }

    /// Refresca solo la marca de latido (PONG y pings de pasillo).
    pub fn touch(&self, agent_id: &str, kind_hint: AgentKind, now_ms: u64) {
        self.ensure_registered(agent_id, kind_hint, now_ms);
        let mut records_guard = self.records.write().expect("LOCK_POISONED: Agent registry");
        if let Some(record) = records_guard.get_mut(agent_id) {
            record.last_seen_ms = now_ms;
        }
    }

    // --- ESTRATO DE CONSULTA ---

    pub fn get(&self, agent_id: &str) -> Option<AgentRecord> {
        let records_guard = self.records.read().expect("LOCK_POISONED: Agent registry");
        records_guard.get(agent_id).cloned()
    }

    /// Todos los agentes, ordenados por id ascendente.
    pub fn get_all(&self) -> Vec<AgentRecord> {
        let records_guard = self.records.read().expect("LOCK_POISONED: Agent registry");
        let mut all: Vec<AgentRecord> = records_guard.values().cloned().collect();
        all.sort_by(|left, right| left.id.cmp(&right.id));
        all
    }

    /// Salud derivada de un agente en el instante dado.
    pub fn health_at(&self, agent_id: &str, now_ms: u64) -> Option<AgentHealth> {
        let records_guard = self.records.read().expect("LOCK_POISONED: Agent registry");
        records_guard
            .get(agent_id)
            .map(|record| record.health_at(now_ms, self.degraded_after_ms, self.offline_after_ms))
    }

    /**
     * Primer agente idle con salud != offline que reclame la
     * capacidad pedida (o cualquiera si capability es None), en orden
     * de id ascendente.
     */
    pub fn get_idle(&self, capability: Option<&str>, now_ms: u64) -> Option<AgentRecord> {
        self.get_all().into_iter().find(|record| {
            let healthy = record.health_at(now_ms, self.degraded_after_ms, self.offline_after_ms)
                != AgentHealth::Offline;
            let capable = capability
                .map(|required| record.capabilities.contains(required))
                .unwrap_or(true);
            record.status == AgentStatus::Idle && healthy && capable
        })
    }

    // --- ESTRATO DE BARRIDO DE SALUD ---

    /**
     * Barrido periódico: computa la salud de todos los agentes y
     * retorna exactamente las transiciones (id, nueva, previa)
     * respecto del barrido anterior.
     */
    pub fn sweep(&self, now_ms: u64) -> Vec<(String, AgentHealth, AgentHealth)> {
        let snapshot = self.get_all();
        let mut health_guard = self.last_health.write().expect("LOCK_POISONED: Health memory");

        let mut transitions = Vec::new();
        for record in snapshot {
            let current = record.health_at(now_ms, self.degraded_after_ms, self.offline_after_ms);
            let previous = health_guard
                .insert(record.id.clone(), current)
                .unwrap_or(AgentHealth::Online);
            if previous != current {
                transitions.push((record.id, current, previous));
            }
        }
        transitions
    }

    /// Snapshot durable para los stores `crafters`/`aisles`.
    pub fn snapshot_of_kind(&self, kind: AgentKind) -> Vec<AgentRecord> {
        self.get_all()
            .into_iter()
            .filter(|record| record.kind == kind)
            .collect()
    }
}
