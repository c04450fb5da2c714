// [libs/infra/driver/src/sim.rs]
/*!
 * =================================================================
 * APARATO: SIMULATED FABRIC DRIVER (V14.2 - PROVING GROUNDS)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: MUNDO EN RAM CON SEMÁNTICA DE PERIFÉRICO REAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. GROUND TRUTH: Actúa como la verdad física contra la que el
 *    índice cacheado se certifica en Proving Grounds.
 * 2. FAULT INJECTION: Contenedores desvanecibles (Unavailable) y
 *    ranuras protegidas (Blocked) para auditar la política de
 *    propagación de fallos del núcleo.
 * 3. STACK PHYSICS: Tope de pila nominal de 64 unidades por ranura,
 *    distribución multi-ranura cuando el destino no está fijado.
 *
 * # Mathematical Proof (Serialized Mutation):
 * Un único Mutex guarda el mundo completo: toda mutación es
 * atómica y las invocaciones sobre la misma ranura quedan
 * serializadas, satisfaciendo el contrato de concurrencia del
 * driver con margen.
 * =================================================================
 */

use crate::errors::DriverFault;
use crate::FabricDriver;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use telar_domain_models::{ItemKey, SlotDetail, SlotItem, SlotMap};

/// Tope de pila nominal por ranura.
const NOMINAL_STACK_LIMIT: u32 = 64;

/// Contenedor simulado con física de ranuras.
#[derive(Debug, Clone)]
pub struct SimContainer {
    pub size: u32,
    pub slots: SlotMap,
    /// Ranuras protegidas por el anfitrión (push/pull -> Blocked).
    pub protected_slots: BTreeSet<u32>,
    /// Un contenedor fuera de línea responde Unavailable a todo.
    pub online: bool,
}

impl SimContainer {
    fn with_capacity(size: u32) -> Self {
        Self {
            size,
            slots: SlotMap::new(),
            protected_slots: BTreeSet::new(),
            online: true,
        }
    }
}

/// Tejido simulado completo: la verdad física del mundo de pruebas.
#[derive(Default)]
pub struct SimulatedFabric {
    world: Mutex<HashMap<String, SimContainer>>,
}

impl SimulatedFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializa un contenedor vacío con la capacidad dada.
    pub fn add_container(&self, name: &str, size: u32) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        world_guard.insert(name.to_string(), SimContainer::with_capacity(size));
    }

    /// Siembra una ranura con un ítem concreto (sobrescribe).
    pub fn seed_slot(&self, name: &str, slot: u32, key: ItemKey, count: u32) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        if let Some(container) = world_guard.get_mut(name) {
            container.slots.insert(
                slot,
                SlotItem {
                    key,
                    count,
                    detail: None,
                },
            );
        }
    }

    /// Marca una ranura como protegida (transferencias -> Blocked).
    pub fn protect_slot(&self, name: &str, slot: u32) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        if let Some(container) = world_guard.get_mut(name) {
            container.protected_slots.insert(slot);
        }
    }

    /// Desvanece un contenedor del tejido (responde Unavailable).
    pub fn vanish(&self, name: &str) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        if let Some(container) = world_guard.get_mut(name) {
            container.online = false;
        }
    }

    /// Restaura un contenedor desvanecido.
    pub fn restore(&self, name: &str) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        if let Some(container) = world_guard.get_mut(name) {
            container.online = true;
        }
    }

    /// Elimina físicamente un contenedor del mundo.
    pub fn demolish(&self, name: &str) {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        world_guard.remove(name);
    }

    /// Instantánea de las ranuras de un contenedor (para aserciones).
    pub fn slots_of(&self, name: &str) -> SlotMap {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        world_guard
            .get(name)
            .map(|container| container.slots.clone())
            .unwrap_or_default()
    }

    /// Conteo total de un base-id dentro de un contenedor.
    pub fn count_of(&self, name: &str, base_id: &str) -> u64 {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        world_guard
            .get(name)
            .map(|container| {
                container
                    .slots
                    .values()
                    .filter(|slot_item| slot_item.key.matches_base(base_id))
                    .map(|slot_item| u64::from(slot_item.count))
                    .sum()
            })
            .unwrap_or(0)
    }

    /**
     * Deposita `amount` unidades en el contenedor destino respetando la
     * física de pilas. Retorna la cantidad aceptada.
     */
    fn accept_into(
        destination: &mut SimContainer,
        key: &ItemKey,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, ()> {
        match destination_slot {
            Some(pinned_slot) => {
                if destination.protected_slots.contains(&pinned_slot) {
                    return Err(());
                }
                let existing = destination.slots.get(&pinned_slot);
                let (current_count, compatible) = match existing {
                    Some(slot_item) => (slot_item.count, slot_item.key == *key),
                    None => (0, true),
                };
                if !compatible {
                    return Ok(0);
                }
                let accepted = amount.min(NOMINAL_STACK_LIMIT.saturating_sub(current_count));
                if accepted > 0 {
                    destination
                        .slots
                        .entry(pinned_slot)
                        .and_modify(|slot_item| slot_item.count += accepted)
                        .or_insert(SlotItem {
                            key: key.clone(),
                            count: accepted,
                            detail: None,
                        });
                }
                Ok(accepted)
            }
            None => {
                let mut remaining = amount;

                // 1. Completar pilas existentes de la misma identidad
                for slot_item in destination.slots.values_mut() {
                    if remaining == 0 {
                        break;
                    }
                    if slot_item.key == *key && slot_item.count < NOMINAL_STACK_LIMIT {
                        let accepted = remaining.min(NOMINAL_STACK_LIMIT - slot_item.count);
                        slot_item.count += accepted;
                        remaining -= accepted;
                    }
                }

                // 2. Abrir ranuras vacías no protegidas
                let mut open_slot = 1u32;
                while remaining > 0 && open_slot <= destination.size {
                    if !destination.slots.contains_key(&open_slot)
                        && !destination.protected_slots.contains(&open_slot)
                    {
                        let accepted = remaining.min(NOMINAL_STACK_LIMIT);
                        destination.slots.insert(
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

                Ok(amount - remaining)
            }
        }
    }

    /**
     * Motor común de movimiento físico entre dos contenedores.
     */
    fn move_between(
        &self,
        source: &str,
        source_slot: u32,
        destination: &str,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, DriverFault> {
        let mut world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");

        // Validaciones de alcance y protección del origen
        {
            let source_container = world_guard
                .get(source)
                .filter(|container| container.online)
                .ok_or_else(|| DriverFault::unavailable(source))?;
            if source_container.protected_slots.contains(&source_slot) {
                return Err(DriverFault::blocked(source, source_slot));
            }
        }

        let destination_online = world_guard
            .get(destination)
            .map(|container| container.online)
            .unwrap_or(false);
        if !destination_online {
            return Err(DriverFault::unavailable(destination));
        }

        // Material disponible en la ranura de origen
        let (moving_key, available) = match world_guard
            .get(source)
            .and_then(|container| container.slots.get(&source_slot))
        {
            Some(slot_item) => (slot_item.key.clone(), slot_item.count),
            None => return Ok(0),
        };
        let offered = amount.min(available);
        if offered == 0 {
            return Ok(0);
        }

        // Aceptación en el destino respetando física de pilas
        let accepted = {
            let destination_container = world_guard
                .get_mut(destination)
                .ok_or_else(|| DriverFault::unavailable(destination))?;
            match Self::accept_into(destination_container, &moving_key, offered, destination_slot) {
                Ok(accepted) => accepted,
                Err(()) => {
                    let blocked_slot = destination_slot.unwrap_or(0);
                    return Err(DriverFault::blocked(destination, blocked_slot));
                }
            }
        };

        // Débito exacto del origen
        if accepted > 0 {
            if let Some(source_container) = world_guard.get_mut(source) {
                if let Some(slot_item) = source_container.slots.get_mut(&source_slot) {
                    slot_item.count -= accepted;
                    if slot_item.count == 0 {
                        source_container.slots.remove(&source_slot);
                    }
                }
            }
        }

        Ok(accepted)
    }
}

#[async_trait]
impl FabricDriver for SimulatedFabric {
    async fn discover(&self) -> Result<Vec<String>, DriverFault> {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        let mut reachable: Vec<String> = world_guard
            .iter()
            .filter(|(_, container)| container.online)
            .map(|(name, _)| name.clone())
            .collect();
        reachable.sort();
        Ok(reachable)
    }

    async fn list(&self, container: &str) -> Result<SlotMap, DriverFault> {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        let target = world_guard
            .get(container)
            .filter(|entry| entry.online)
            .ok_or_else(|| DriverFault::unavailable(container))?;

        // list() entrega identidad y conteo; el detalle viaja por detail()
        let snapshot = target
            .slots
            .iter()
            .map(|(slot, slot_item)| {
                (
                    *slot,
                    SlotItem {
                        key: slot_item.key.clone(),
                        count: slot_item.count,
                        detail: None,
                    },
                )
            })
            .collect();
        Ok(snapshot)
    }

    async fn detail(&self, container: &str, slot: u32) -> Result<Option<SlotDetail>, DriverFault> {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        let target = world_guard
            .get(container)
            .filter(|entry| entry.online)
            .ok_or_else(|| DriverFault::unavailable(container))?;

        Ok(target.slots.get(&slot).map(|slot_item| SlotDetail {
            key: slot_item.key.clone(),
            count: slot_item.count,
            display_name: None,
            opaque_fields: serde_json::Value::Null,
        }))
    }

    async fn size(&self, container: &str) -> Result<u32, DriverFault> {
        let world_guard = self.world.lock().expect("LOCK_POISONED: Sim world");
        world_guard
            .get(container)
            .filter(|entry| entry.online)
            .map(|entry| entry.size)
            .ok_or_else(|| DriverFault::unavailable(container))
    }

    async fn push(
        &self,
        source: &str,
        source_slot: u32,
        destination: &str,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, DriverFault> {
        self.move_between(source, source_slot, destination, amount, destination_slot)
    }

    async fn pull(
        &self,
        destination: &str,
        source: &str,
        source_slot: u32,
        amount: u32,
        destination_slot: Option<u32>,
    ) -> Result<u32, DriverFault> {
        self.move_between(source, source_slot, destination, amount, destination_slot)
    }
}
