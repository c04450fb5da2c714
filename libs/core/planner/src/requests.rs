// [libs/core/planner/src/requests.rs]
/*!
 * =================================================================
 * APARATO: REQUEST LEDGER (V17.2 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE STATE MODEL (ESTRATO L1)
 * RESPONSABILIDAD: CICLO DE VIDA DE METAS DE USUARIO Y SUS JOBS
 *
 * # Logic:
 * pending -> queued -> crafting|smelting -> ready -> delivered, con
 * salidas terminales failed/cancelled. Las metas terminales caducan
 * tras max_age y se purgan en el barrido de limpieza.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use telar_domain_models::{ItemKey, Request, RequestStatus};
use tracing::{debug, info};

/// Edad máxima nominal de una meta terminal antes de su purga (1 h).
const NOMINAL_REQUEST_MAX_AGE_MS: u64 = 3_600_000;

/// Libro mayor de metas de usuario.
#[derive(Debug)]
pub struct RequestLedger {
    next_request_id: u64,
    requests: BTreeMap<u64, Request>,
    max_age_ms: u64,
}

/// Snapshot durable del libro mayor (store `requests`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub next_request_id: u64,
    pub requests: Vec<Request>,
}

impl Default for RequestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLedger {
    pub fn new() -> Self {
        Self {
            next_request_id: 1,
            requests: BTreeMap::new(),
            max_age_ms: NOMINAL_REQUEST_MAX_AGE_MS,
        }
    }

    pub fn with_max_age_ms(mut self, max_age_ms: u64) -> Self {
        self.max_age_ms = max_age_ms;
        self
    }

    /// Crea una meta en estado `pending`.
    pub fn create(
        &mut self,
        item: ItemKey,
        qty: u32,
        deliver_to: Option<String>,
        is_smelt: bool,
        now_ms: u64,
    ) -> Request {
        let request = Request {
            id: self.next_request_id,
            item,
            qty,
            deliver_to,
            is_smelt,
            status: RequestStatus::Pending,
            job_ids: Vec::new(),
            produced: 0,
            delivered: 0,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            failure_reason: None,
        };
        self.next_request_id += 1;

        info!("🎯 [LEDGER_OPEN]: Request {} created: [{}] x{}.",
            request.id, request.item, request.qty);

        self.requests.insert(request.id, request.clone());
        request
    }

    pub fn get(&self, request_id: u64) -> Option<&Request> {
        self.requests.get(&request_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Request> {
        self.requests.values()
    }

    /// Metas no terminales que aún requieren progreso.
    pub fn open_requests(&self) -> Vec<Request> {
        self.requests
            .values()
            .filter(|request| !request.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Adjunta jobs encolados y promueve `pending -> queued`.
    pub fn attach_jobs(&mut self, request_id: u64, job_ids: &[u64], now_ms: u64) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.job_ids.extend_from_slice(job_ids);
            if request.status == RequestStatus::Pending && !request.job_ids.is_empty() {
                request.status = RequestStatus::Queued;
            }
            request.updated_at_ms = now_ms;
        }
    }

    /// Transición explícita de estado con sello temporal.
    pub fn transition(&mut self, request_id: u64, status: RequestStatus, now_ms: u64) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            if request.status != status {
                debug!("🔄 [LEDGER_SHIFT]: Request {} {:?} -> {:?}.",
                    request_id, request.status, status);
                request.status = status;
                request.updated_at_ms = now_ms;
            }
        }
    }

    /// Registra producción confirmada; promueve a `ready` al cubrir qty.
    pub fn note_produced(&mut self, request_id: u64, produced: u32, now_ms: u64) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.produced = request.produced.saturating_add(produced);
            request.updated_at_ms = now_ms;
            if request.produced >= request.qty && !request.status.is_terminal() {
                request.status = RequestStatus::Ready;
                info!("📦 [LEDGER_READY]: Request {} covered ({}/{}).",
                    request_id, request.produced, request.qty);
            }
        }
    }

    /// Registra entrega confirmada; sella `delivered` al cubrir qty.
    pub fn note_delivered(&mut self, request_id: u64, delivered: u32, now_ms: u64) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.delivered = request.delivered.saturating_add(delivered);
            request.updated_at_ms = now_ms;
            if request.delivered >= request.qty {
                request.status = RequestStatus::Delivered;
            }
        }
    }

    /// Fallo terminal con justificación técnica.
    pub fn mark_failed(&mut self, request_id: u64, reason: &str, now_ms: u64) {
        if let Some(request) = self.requests.get_mut(&request_id) {
            request.status = RequestStatus::Failed;
            request.failure_reason = Some(reason.to_string());
            request.updated_at_ms = now_ms;
        }
    }

    /// ¿Posee esta meta el job dado?
    pub fn owner_of_job(&self, job_id: u64) -> Option<u64> {
        self.requests
            .values()
            .find(|request| request.job_ids.contains(&job_id))
            .map(|request| request.id)
    }

    /// Purga metas terminales más viejas que max_age. Retorna purgadas.
    pub fn cleanup(&mut self, now_ms: u64) -> usize {
        let expiration_floor = now_ms.saturating_sub(self.max_age_ms);
        let expired: Vec<u64> = self
            .requests
            .values()
            .filter(|request| request.status.is_terminal() && request.updated_at_ms < expiration_floor)
            .map(|request| request.id)
            .collect();

        for request_id in &expired {
            self.requests.remove(request_id);
        }
        expired.len()
    }

    // --- ESTRATO DE DURABILIDAD ---

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            next_request_id: self.next_request_id,
            requests: self.requests.values().cloned().collect(),
        }
    }

    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        self.next_request_id = snapshot.next_request_id.max(1);
        self.requests = snapshot
            .requests
            .into_iter()
            .map(|request| (request.id, request))
            .collect();
    }
}
