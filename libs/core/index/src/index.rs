// [libs/core/index/src/index.rs]
/*!
 * =================================================================
 * APARATO: INVENTORY INDEX ENGINE (V15.4 - FABRIC GOLD)
 * CLASIFICACIÓN: CORE STATE MODEL (ESTRATO L1)
 * RESPONSABILIDAD: VISTA AUTORITATIVA-POR-AHORA DE LOS CONTENEDORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DERIVED VIEWS: Slots es la estructura primaria; Stock,
 *    Locations y BaseIndex son vistas derivadas mantenidas en cada
 *    observación o delta como un paso atómico.
 * 2. BATCH AMORTIZATION: beginBatch/endBatch suspende el
 *    mantenimiento de vistas derivadas y las reconstruye una sola
 *    vez, amortizando ráfagas de transferencias en el tick caliente.
 * 3. STALE TOLERANCE: Un contenedor que falla list() retiene sus
 *    entradas marcadas stale; dos scans consecutivos ausentes lo
 *    eliminan con todas sus derivadas.
 *
 * # Mathematical Proof (Invariant Closure):
 * Tras cada observación o delta fuera de sesión batch se cumple:
 *   (1) Σ slots[C].count es el total físico cacheado de C;
 *   (2) Stock[k] = Σ Locations[k].count;
 *   (3) cada Location aparece en Slots con la misma identidad y conteo;
 *   (4) BaseIndex[b] = { k | k.base_id = b ∧ Stock[k] > 0 };
 *   (5) EmptyCounts[C] = size[C] − |Slots[C]|.
 * La deriva frente a la realidad queda acotada por una transferencia
 * en vuelo por (contenedor, ranura) entre fronteras de scan.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use telar_domain_models::{ContainerRole, ContainerSnapshot, ItemKey, SlotItem, SlotMap};
use tracing::{debug, warn};

/// Scans consecutivos ausentes antes de eliminar un contenedor.
const ABSENT_SCAN_EVICTION_THRESHOLD: u8 = 2;

/// Tope de pila usado por la proyección de destino desconocido.
const PROJECTED_STACK_LIMIT: u32 = 64;

/// Ubicación candidata de un ítem: (contenedor, ranura, conteo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub container: String,
    pub slot: u32,
    pub count: u32,
}

/// Entrada cacheada de un contenedor rastreado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub role: ContainerRole,
    pub size: u32,
    pub slots: SlotMap,
    /// El último list() falló; las transferencias lo omiten.
    pub stale: bool,
    /// Scans consecutivos en los que el periférico no respondió.
    pub missed_scans: u8,
    /// Deltas con ranura destino desconocida pendientes de rescan.
    pub dirty: bool,
}

impl ContainerEntry {
    /// Invariante (5): ranuras vacías = capacidad − ranuras ocupadas.
    pub fn empty_slot_count(&self) -> u32 {
        self.size.saturating_sub(self.slots.len() as u32)
    }
}

/// Vista cacheada e incrementalmente actualizada del tejido completo.
#[derive(Debug, Default)]
pub struct InventoryIndex {
    containers: HashMap<String, ContainerEntry>,
    stock: HashMap<ItemKey, u64>,
    locations: HashMap<ItemKey, Vec<Location>>,
    base_index: HashMap<String, BTreeSet<ItemKey>>,
    /// Blobs de detalle opacos cacheados en la primera observación.
    details: HashMap<ItemKey, serde_json::Value>,
    /// Profundidad de sesión batch; > 0 suspende vistas derivadas.
    batch_depth: u32,
}

impl InventoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // --- ESTRATO DE OBSERVACIÓN (SCAN AUTORITATIVO) ---

    /**
     * Integra la instantánea autoritativa de un contenedor.
     * Resetea stale/dirty y reconstruye sus vistas derivadas.
     */
    pub fn observe_container(&mut self, snapshot: ContainerSnapshot, role: ContainerRole) {
        let entry = ContainerEntry {
            role,
            size: snapshot.size,
            slots: snapshot.slots,
            stale: false,
            missed_scans: 0,
            dirty: false,
        };
        self.containers.insert(snapshot.name, entry);
        if self.batch_depth == 0 {
            self.rebuild_derived_views();
        } else {
            self.recompute_stock_only();
        }
    }

    /**
     * Registra un fallo de list() sobre un contenedor rastreado.
     * Sus entradas previas se retienen marcadas stale; al segundo
     * scan ausente consecutivo el contenedor se elimina.
     *
     * Retorna true si el contenedor fue desalojado.
     */
    pub fn mark_unreachable(&mut self, container: &str) -> bool {
        let should_evict = match self.containers.get_mut(container) {
            Some(entry) => {
                entry.stale = true;
                entry.missed_scans = entry.missed_scans.saturating_add(1);
                entry.missed_scans >= ABSENT_SCAN_EVICTION_THRESHOLD
            }
            None => false,
        };

        if should_evict {
            warn!("🗑️ [INDEX_EVICTION]: Container [{}] absent for {} scans. Removing.",
                container, ABSENT_SCAN_EVICTION_THRESHOLD);
            self.remove_container(container);
        }
        should_evict
    }

    /// Elimina un contenedor con todas sus entradas derivadas.
    pub fn remove_container(&mut self, container: &str) {
        if self.containers.remove(container).is_some() {
            if self.batch_depth == 0 {
                self.rebuild_derived_views();
            } else {
                self.recompute_stock_only();
            }
        }
    }

    // --- ESTRATO DE CONSULTA ---

    pub fn container(&self, name: &str) -> Option<&ContainerEntry> {
        self.containers.get(name)
    }

    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn role_of(&self, container: &str) -> Option<ContainerRole> {
        self.containers.get(container).map(|entry| entry.role)
    }

    /// ¿Está el contenedor marcado stale (omitir en transferencias)?
    pub fn is_stale(&self, container: &str) -> bool {
        self.containers
            .get(container)
            .map(|entry| entry.stale)
            .unwrap_or(true)
    }

    pub fn get_stock(&self, key: &ItemKey) -> u64 {
        self.stock.get(key).copied().unwrap_or(0)
    }

    /// Instantánea completa del stock (para caches y monitor).
    pub fn stock_snapshot(&self) -> HashMap<ItemKey, u64> {
        self.stock.clone()
    }

    /// Identidades con stock positivo para un base-id dado.
    pub fn keys_for_base(&self, base_id: &str) -> Vec<ItemKey> {
        self.base_index
            .get(base_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /**
     * Ubicaciones candidatas para una identidad exacta, ordenadas por
     * conteo descendente (pila más grande primero) con desempate
     * determinista por (contenedor, ranura). Contenedores stale se
     * omiten; `storage_only` filtra roles no-Storage.
     */
    pub fn find_item(&self, key: &ItemKey, storage_only: bool) -> Vec<Location> {
        let mut candidates: Vec<Location> = self
            .locations
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|location| self.location_is_eligible(location, storage_only))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        candidates.sort_by(|left, right| {
            right
                .count
                .cmp(&left.count)
                .then_with(|| left.container.cmp(&right.container))
                .then_with(|| left.slot.cmp(&right.slot))
        });
        candidates
    }

    /**
     * Ubicaciones candidatas para cualquier variante NBT de un
     * base-id, con el mismo orden determinista que `find_item`.
     */
    pub fn find_by_base_id(&self, base_id: &str, storage_only: bool) -> Vec<(ItemKey, Location)> {
        let mut candidates: Vec<(ItemKey, Location)> = Vec::new();
        for key in self.keys_for_base(base_id) {
            for location in self.find_item(&key, storage_only) {
                candidates.push((key.clone(), location));
            }
        }
        candidates.sort_by(|left, right| {
            right
                .1
                .count
                .cmp(&left.1.count)
                .then_with(|| left.1.container.cmp(&right.1.container))
                .then_with(|| left.1.slot.cmp(&right.1.slot))
        });
        candidates
    }

    /**
     * Contenedores de almacenamiento no-stale ordenados por ranuras
     * vacías descendentes (objetivos preferentes de drenaje).
     */
    pub fn storage_drain_targets(&self) -> Vec<(String, u32)> {
        let mut targets: Vec<(String, u32)> = self
            .containers
            .iter()
            .filter(|(_, entry)| entry.role == ContainerRole::Storage && !entry.stale)
            .map(|(name, entry)| (name.clone(), entry.empty_slot_count()))
            .collect();
        targets.sort_by(|left, right| {
            right
                .1
                .cmp(&left.1)
                .then_with(|| left.0.cmp(&right.0))
        });
        targets
    }

    /// Invariante (5) expuesta por contenedor.
    pub fn empty_slot_count(&self, container: &str) -> u32 {
        self.containers
            .get(container)
            .map(ContainerEntry::empty_slot_count)
            .unwrap_or(0)
    }

    // --- ESTRATO DE DETALLE OPACO ---

    /// Cachea el blob de detalle de una identidad (primera observación gana).
    pub fn remember_detail(&mut self, key: ItemKey, detail_blob: serde_json::Value) {
        self.details.entry(key).or_insert(detail_blob);
    }

    pub fn detail_of(&self, key: &ItemKey) -> Option<&serde_json::Value> {
        self.details.get(key)
    }

    pub fn detail_snapshot(&self) -> HashMap<ItemKey, serde_json::Value> {
        self.details.clone()
    }

    // --- ESTRATO DE DELTAS (MUTACIÓN INCREMENTAL) ---

    /**
     * Aplica el delta de una transferencia confirmada: decrementa la
     * ubicación origen e incrementa el destino en un solo paso.
     *
     * # Logic:
     * Con ranura destino desconocida (None) el conteo se proyecta
     * sobre la vista cacheada (rellenando pilas de la misma identidad
     * y luego ranuras vacías) y el contenedor queda marcado dirty:
     * el Stock es exacto de inmediato, la atribución por ranura se
     * corrige en el siguiente rescan autoritativo del contenedor.
     */
    pub fn record_transfer(
        &mut self,
        from_container: &str,
        from_slot: u32,
        to_container: &str,
        to_slot: Option<u32>,
        key: &ItemKey,
        amount: u32,
    ) {
        if amount == 0 {
            return;
        }

        // 1. DÉBITO DEL ORIGEN (clamp defensivo contra deriva)
        if let Some(entry) = self.containers.get_mut(from_container) {
            if let Some(slot_item) = entry.slots.get_mut(&from_slot) {
                if slot_item.key != *key {
                    warn!("⚠️ [INDEX_DRIFT]: Delta key mismatch at [{}:{}]. Clamping to observed identity.",
                        from_container, from_slot);
                }
                let debited = slot_item.count.min(amount);
                slot_item.count -= debited;
                if slot_item.count == 0 {
                    entry.slots.remove(&from_slot);
                }
            } else {
                debug!("⚠️ [INDEX_DRIFT]: Delta from empty cached slot [{}:{}].",
                    from_container, from_slot);
            }
        }

        // 2. CRÉDITO DEL DESTINO
        if let Some(entry) = self.containers.get_mut(to_container) {
            match to_slot {
                Some(pinned_slot) => {
                    entry
                        .slots
                        .entry(pinned_slot)
                        .and_modify(|slot_item| slot_item.count += amount)
                        .or_insert(SlotItem {
                            key: key.clone(),
                            count: amount,
                            detail: None,
                        });
                }
                None => {
                    Self::project_unpinned_credit(entry, key, amount);
                    entry.dirty = true;
                }
            }
        }

        // 3. CIERRE DE VISTAS DERIVADAS
        if self.batch_depth == 0 {
            self.rebuild_derived_views();
        } else {
            // Sesión batch: solo el Stock se mantiene exacto en caliente
            self.recompute_stock_only();
        }
    }

    /**
     * Proyección de crédito sin ranura fijada sobre la vista cacheada.
     * Rellena pilas existentes de la misma identidad, luego abre
     * ranuras vacías. El remanente (artefacto de caché imposible en
     * físico) se apila en la última posición conocida y se corrige
     * en el rescan.
     */
    fn project_unpinned_credit(entry: &mut ContainerEntry, key: &ItemKey, amount: u32) {
        let mut remaining = amount;

        for slot_item in entry.slots.values_mut() {
            if remaining == 0 {
                return;
            }
            if slot_item.key == *key && slot_item.count < PROJECTED_STACK_LIMIT {
                let accepted = remaining.min(PROJECTED_STACK_LIMIT - slot_item.count);
                slot_item.count += accepted;
                remaining -= accepted;
            }
        }

        let mut open_slot = 1u32;
        while remaining > 0 && open_slot <= entry.size {
            if !entry.slots.contains_key(&open_slot) {
                let accepted = remaining.min(PROJECTED_STACK_LIMIT);
                entry.slots.insert(
                    open_slot,
                    SlotItem {
                        key: key.clone(),
                        count: accepted,
                        detail: None,
                    },
                );
                remaining -= accepted;
            }
            open_slot += 1;
        }

        if remaining > 0 {
            let overflow_slot = entry.slots.keys().next_back().copied().unwrap_or(1);
            entry
                .slots
                .entry(overflow_slot)
                .and_modify(|slot_item| slot_item.count += remaining)
                .or_insert(SlotItem {
                    key: key.clone(),
                    count: remaining,
                    detail: None,
                });
        }
    }

    // --- ESTRATO DE SESIONES BATCH ---

    /**
     * Suspende el mantenimiento de Locations/BaseIndex. Los callers
     * que emiten ráfagas de transferencias en un mismo tick DEBEN
     * envolverlas en una sesión batch.
     */
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Cierra la sesión; en profundidad cero reconstruye las derivadas.
    pub fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth == 0 {
            self.rebuild_derived_views();
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    // --- ESTRATO DE CIERRE DE INVARIANTES ---

    fn location_is_eligible(&self, location: &Location, storage_only: bool) -> bool {
        match self.containers.get(&location.container) {
            Some(entry) => {
                if entry.stale {
                    debug!("💤 [INDEX_SKIP]: Stale container [{}] excluded from candidates.",
                        location.container);
                    return false;
                }
                !storage_only || entry.role == ContainerRole::Storage
            }
            None => false,
        }
    }

    /// Reconstruye Stock, Locations y BaseIndex desde Slots.
    fn rebuild_derived_views(&mut self) {
        self.stock.clear();
        self.locations.clear();
        self.base_index.clear();

        for (container_name, entry) in &self.containers {
            for (slot, slot_item) in &entry.slots {
                if slot_item.count == 0 {
                    continue;
                }
                *self.stock.entry(slot_item.key.clone()).or_insert(0) += u64::from(slot_item.count);
                self.locations
                    .entry(slot_item.key.clone())
                    .or_default()
                    .push(Location {
                        container: container_name.clone(),
                        slot: *slot,
                        count: slot_item.count,
                    });
                self.base_index
                    .entry(slot_item.key.base_id.clone())
                    .or_default()
                    .insert(slot_item.key.clone());
            }
        }
    }

    /// Camino barato del tick caliente: solo el total de Stock.
    fn recompute_stock_only(&mut self) {
        self.stock.clear();
        for entry in self.containers.values() {
            for slot_item in entry.slots.values() {
                if slot_item.count > 0 {
                    *self.stock.entry(slot_item.key.clone()).or_insert(0) +=
                        u64::from(slot_item.count);
                }
            }
        }
    }

    /**
     * Auditoría de las invariantes (1)-(5). Una violación aquí señala
     * un camino interno corrupto: el tick debe abortar con diagnóstico
     * y forzar rescan en el siguiente.
     */
    pub fn verify_invariants(&self) -> Result<(), String> {
        if self.in_batch() {
            return Err("BATCH_OPEN: Derived views suspended; audit is undefined.".into());
        }

        // (2)+(3): Stock[k] = Σ Locations[k] y cada Location refleja Slots
        for (key, entries) in &self.locations {
            let mut located_total = 0u64;
            for location in entries {
                let cached = self
                    .containers
                    .get(&location.container)
                    .and_then(|entry| entry.slots.get(&location.slot));
                match cached {
                    Some(slot_item) if slot_item.key == *key && slot_item.count == location.count => {
                        located_total += u64::from(location.count);
                    }
                    _ => {
                        return Err(format!(
                            "INVARIANT_3_BREACH: Location [{}:{}] diverges from Slots for {}.",
                            location.container, location.slot, key
                        ))
                    }
                }
            }
            if self.get_stock(key) != located_total {
                return Err(format!(
                    "INVARIANT_2_BREACH: Stock[{}]={} but Locations sum {}.",
                    key,
                    self.get_stock(key),
                    located_total
                ));
            }
        }

        // (4): BaseIndex[b] = claves con stock positivo de ese base
        for (base_id, keys) in &self.base_index {
            for key in keys {
                if key.base_id != *base_id || self.get_stock(key) == 0 {
                    return Err(format!(
                        "INVARIANT_4_BREACH: BaseIndex[{}] carries {} with stock {}.",
                        base_id,
                        key,
                        self.get_stock(key)
                    ));
                }
            }
        }
        for key in self.stock.keys() {
            let indexed = self
                .base_index
                .get(&key.base_id)
                .map(|keys| keys.contains(key))
                .unwrap_or(false);
            if !indexed {
                return Err(format!("INVARIANT_4_BREACH: {} missing from BaseIndex.", key));
            }
        }

        Ok(())
    }
}
