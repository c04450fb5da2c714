// [libs/core/planner/src/queue.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN JOB QUEUE (V17.3 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE STATE MODEL (ESTRATO L1)
 * RESPONSABILIDAD: COLA FIFO DURABLE CON MÁQUINA DE ESTADOS DE JOBS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MONOTONIC IDENTITY: Los identificadores de Job son enteros
 *    monotónicos persistentes entre reinicios (snapshot durable).
 * 2. BOUNDED ARCHIVE: Los estados terminales migran a anillos de
 *    historia acotados (100 por clase) para analítica y undo.
 * 3. EXACT RESERVATION: add() congela el multiset exacto de insumos
 *    (inputs × crafts) contra el stock entregado por el caller.
 *
 * # Mathematical Proof (FIFO Dispatch):
 * pull del frente + push al final garantiza orden de creación; el
 * rollback de asignaciones fallidas reingresa por el frente para
 * preservar prioridad.
 * =================================================================
 */

use crate::errors::QueueFault;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use telar_domain_models::{ItemKey, Job, JobStatus, MissingMaterial, RecipeBook, RecipeInput};
use tracing::{debug, info};

/// Capacidad de cada anillo de historia terminal.
const TERMINAL_HISTORY_RING_CAPACITY: usize = 100;

/// Cola FIFO soberana de jobs de crafteo.
#[derive(Debug, Default)]
pub struct JobQueue {
    next_job_id: u64,
    pending: VecDeque<Job>,
    /// Jobs asignados o en crafteo, indexados por id.
    active: HashMap<u64, Job>,
    completed_history: VecDeque<Job>,
    failed_history: VecDeque<Job>,
}

/// Snapshot durable de la cola (estado no terminal + contador).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub next_job_id: u64,
    pub pending: Vec<Job>,
    pub active: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            next_job_id: 1,
            pending: VecDeque::new(),
            active: HashMap::new(),
            completed_history: VecDeque::with_capacity(TERMINAL_HISTORY_RING_CAPACITY),
            failed_history: VecDeque::with_capacity(TERMINAL_HISTORY_RING_CAPACITY),
        }
    }

    // --- ESTRATO DE CREACIÓN Y RESERVA ---

    /**
     * Crea un Job para producir >= qty unidades del ítem dado.
     *
     * # Errors:
     * - `NoRecipe`: el libro no define crafteo para el base-id.
     * - `MissingMaterials`: insumos cortos contra el stock entregado;
     *   porta la lista estructurada (item, needed, have).
     */
    pub fn add(
        &mut self,
        output: ItemKey,
        qty: u32,
        stock: &HashMap<ItemKey, u64>,
        recipes: &RecipeBook,
        now_ms: u64,
    ) -> Result<Job, QueueFault> {
        let recipe = recipes
            .craft_recipe(&output.base_id)
            .ok_or_else(|| QueueFault::NoRecipe { item: output.clone() })?
            .clone();

        let crafts = qty.div_ceil(recipe.output_count.max(1));

        // Multiset exacto de insumos: inputs × crafts
        let materials: Vec<RecipeInput> = recipe
            .inputs
            .iter()
            .map(|input| RecipeInput {
                item: input.item.clone(),
                count: input.count * crafts,
            })
            .collect();

        let missing: Vec<MissingMaterial> = materials
            .iter()
            .filter_map(|material| {
                let needed = u64::from(material.count);
                let have = stock.get(&material.item).copied().unwrap_or(0);
                (have < needed).then(|| MissingMaterial {
                    item: material.item.clone(),
                    needed,
                    have,
                })
            })
            .collect();

        if !missing.is_empty() {
            debug!("📉 [QUEUE_SHORT]: Cannot reserve [{}] x{}: {} inputs short.",
                output, qty, missing.len());
            return Err(QueueFault::MissingMaterials { missing });
        }

        let job = Job {
            id: self.next_job_id,
            output,
            qty,
            crafts,
            recipe,
            materials,
            status: JobStatus::Pending,
            assigned_to: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            actual_output: None,
            failure_reason: None,
        };
        self.next_job_id += 1;

        info!("📋 [QUEUE_ADD]: Job {} enqueued: [{}] x{} ({} crafts).",
            job.id, job.output, job.qty, job.crafts);

        self.pending.push_back(job.clone());
        Ok(job)
    }

    // --- ESTRATO DE MÁQUINA DE ESTADOS ---

    /// Primer job pendiente sin consumirlo (inspección del despachador).
    pub fn next_pending(&self) -> Option<&Job> {
        self.pending.front()
    }

    /// Transición `pending -> assigned` con sello de propiedad.
    pub fn assign(&mut self, job_id: u64, agent_id: &str, now_ms: u64) -> Result<Job, QueueFault> {
        let position = self
            .pending
            .iter()
            .position(|job| job.id == job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        let mut job = self
            .pending
            .remove(position)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        job.status = JobStatus::Assigned;
        job.assigned_to = Some(agent_id.to_string());
        job.updated_at_ms = now_ms;

        self.active.insert(job.id, job.clone());
        Ok(job)
    }

    /// Reingresa por el frente un job cuya asignación colapsó.
    pub fn rollback_assignment(&mut self, job_id: u64, now_ms: u64) -> Result<(), QueueFault> {
        let mut job = self
            .active
            .remove(&job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;
        job.status = JobStatus::Pending;
        job.assigned_to = None;
        job.updated_at_ms = now_ms;
        self.pending.push_front(job);
        Ok(())
    }

    /// Transición `assigned -> crafting`.
    pub fn start_crafting(&mut self, job_id: u64, now_ms: u64) -> Result<(), QueueFault> {
        let job = self
            .active
            .get_mut(&job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        if job.status != JobStatus::Assigned {
            return Err(QueueFault::InvalidTransition {
                job_id,
                from: job.status,
                to: JobStatus::Crafting,
            });
        }
        job.status = JobStatus::Crafting;
        job.updated_at_ms = now_ms;
        Ok(())
    }

    /// Transición terminal `assigned|crafting -> completed`.
    pub fn complete(
        &mut self,
        job_id: u64,
        actual_output: Option<u32>,
        now_ms: u64,
    ) -> Result<Job, QueueFault> {
        let mut job = self
            .active
            .remove(&job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        job.status = JobStatus::Completed;
        job.actual_output = actual_output;
        job.updated_at_ms = now_ms;

        Self::archive(&mut self.completed_history, job.clone());
        info!("✅ [QUEUE_SEAL]: Job {} completed ({} produced).",
            job_id, actual_output.unwrap_or(job.qty));
        Ok(job)
    }

    /// Transición terminal `assigned|crafting -> failed` con razón.
    pub fn fail(&mut self, job_id: u64, reason: &str, now_ms: u64) -> Result<Job, QueueFault> {
        let mut job = self
            .active
            .remove(&job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        job.status = JobStatus::Failed;
        job.failure_reason = Some(reason.to_string());
        job.updated_at_ms = now_ms;

        Self::archive(&mut self.failed_history, job.clone());
        Ok(job)
    }

    /// Cancelación: alcanzable SOLO desde `pending`.
    pub fn cancel(&mut self, job_id: u64, now_ms: u64) -> Result<Job, QueueFault> {
        let position = self
            .pending
            .iter()
            .position(|job| job.id == job_id)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        let mut job = self
            .pending
            .remove(position)
            .ok_or(QueueFault::UnknownJob { job_id })?;

        job.status = JobStatus::Cancelled;
        job.updated_at_ms = now_ms;
        Self::archive(&mut self.failed_history, job.clone());
        Ok(job)
    }

    fn archive(ring: &mut VecDeque<Job>, job: Job) {
        if ring.len() >= TERMINAL_HISTORY_RING_CAPACITY {
            ring.pop_front();
        }
        ring.push_back(job);
    }

    // --- ESTRATO DE CONSULTA ---

    pub fn job(&self, job_id: u64) -> Option<&Job> {
        self.active
            .get(&job_id)
            .or_else(|| self.pending.iter().find(|job| job.id == job_id))
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn completed_history(&self) -> impl Iterator<Item = &Job> {
        self.completed_history.iter()
    }

    pub fn failed_history(&self) -> impl Iterator<Item = &Job> {
        self.failed_history.iter()
    }

    // --- ESTRATO DE DURABILIDAD ---

    /// Snapshot del estado no terminal para el store `queue`.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            next_job_id: self.next_job_id,
            pending: self.pending.iter().cloned().collect(),
            active: self.active.values().cloned().collect(),
        }
    }

    /// Rehidrata la cola desde un snapshot durable.
    pub fn restore(&mut self, snapshot: QueueSnapshot) {
        self.next_job_id = snapshot.next_job_id.max(1);
        self.pending = snapshot.pending.into();
        self.active = snapshot
            .active
            .into_iter()
            .map(|job| (job.id, job))
            .collect();
    }
}
