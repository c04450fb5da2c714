// [libs/infra/store/src/store.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENT RECORD STORE (V19.3 - FABRIC GOLD)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: DOCUMENTOS CLAVE -> JSON CON ESCRITURA ATÓMICA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE FILE PER NAME: Cada persist(name) posee un archivo; las
 *    escrituras se serializan por archivo mediante su cerrojo.
 * 2. BATCH COALESCING: Escrituras multi-campo envueltas en
 *    begin_batch/end_batch colapsan en un único volcado a disco.
 *
 * # Mathematical Proof (Atomic Overwrite):
 * El documento completo se materializa en '<name>.json.tmp' y se
 * renombra sobre '<name>.json'. El rename es atómico en el sistema
 * de archivos anfitrión: un lector concurrente observa el estado
 * previo o el nuevo, jamás un intermedio.
 * =================================================================
 */

use crate::errors::StoreFault;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

struct StoreState {
    records: BTreeMap<String, serde_json::Value>,
    batch_depth: u32,
    pending_flush: bool,
}

/// Store de registros durable direccionado por nombre estable.
pub struct RecordStore {
    name: String,
    file_path: PathBuf,
    state: Mutex<StoreState>,
}

impl RecordStore {
    /**
     * Abre (o crea) el store bajo el directorio raíz dado.
     * Un documento ilegible se trata como corrupción recuperable:
     * se conserva el archivo y se arranca con estado vacío.
     */
    pub fn open(root: &Path, name: &str) -> Result<Self, StoreFault> {
        fs::create_dir_all(root)?;
        let file_path = root.join(format!("{}.json", name));

        let records = if file_path.exists() {
            match fs::read(&file_path) {
                Ok(raw_document) => match serde_json::from_slice(&raw_document) {
                    Ok(records) => records,
                    Err(corruption) => {
                        warn!("🗄️ [STORE_CORRUPTION]: [{}] unreadable, starting empty: {}",
                            name, corruption);
                        BTreeMap::new()
                    }
                },
                Err(io_fault) => return Err(StoreFault::IoFault(io_fault)),
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            name: name.to_string(),
            file_path,
            state: Mutex::new(StoreState {
                records,
                batch_depth: 0,
                pending_flush: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // --- ESTRATO DE LECTURA ---

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard
            .records
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        let state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard.records.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- ESTRATO DE ESCRITURA ---

    /// Inserta o sobrescribe un registro; persiste salvo sesión batch.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreFault> {
        let mut state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        let encoded = serde_json::to_value(value)?;
        state_guard.records.insert(key.to_string(), encoded);
        self.flush_or_defer(&mut state_guard)
    }

    /// Elimina un registro; persiste salvo sesión batch.
    pub fn remove(&self, key: &str) -> Result<(), StoreFault> {
        let mut state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        if state_guard.records.remove(key).is_some() {
            return self.flush_or_defer(&mut state_guard);
        }
        Ok(())
    }

    /// Suspende los volcados a disco hasta el cierre de la sesión.
    pub fn begin_batch(&self) {
        let mut state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard.batch_depth += 1;
    }

    /// Cierra la sesión; en profundidad cero ejecuta un único volcado.
    pub fn end_batch(&self) -> Result<(), StoreFault> {
        let mut state_guard = self.state.lock().expect("LOCK_POISONED: Record store");
        state_guard.batch_depth = state_guard.batch_depth.saturating_sub(1);
        if state_guard.batch_depth == 0 && state_guard.pending_flush {
            state_guard.pending_flush = false;
            self.persist_locked(&state_guard)?;
        }
        Ok(())
    }

    fn flush_or_defer(&self, state_guard: &mut StoreState) -> Result<(), StoreFault> {
        if state_guard.batch_depth > 0 {
            state_guard.pending_flush = true;
            return Ok(());
        }
        self.persist_locked(state_guard)
    }

    /// Volcado atómico: temporal + rename sobre el documento final.
    fn persist_locked(&self, state_guard: &StoreState) -> Result<(), StoreFault> {
        let document = serde_json::to_vec_pretty(&state_guard.records)?;
        let staging_path = self.file_path.with_extension("json.tmp");
        fs::write(&staging_path, document)?;
        fs::rename(&staging_path, &self.file_path)?;
        debug!("🗄️ [STORE_SEAL]: [{}] persisted ({} records).",
            self.name, state_guard.records.len());
        Ok(())
    }
}

/// Fábrica cacheada de stores bajo un directorio raíz común.
pub struct StoreHub {
    root: PathBuf,
    open_stores: Mutex<HashMap<String, Arc<RecordStore>>>,
}

impl StoreHub {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open_stores: Mutex::new(HashMap::new()),
        }
    }

    /**
     * Entrega el store nombrado, abriéndolo en el primer acceso.
     * Una instancia por nombre: las escrituras quedan serializadas
     * por el cerrojo interno del store.
     */
    pub fn store(&self, name: &str) -> Result<Arc<RecordStore>, StoreFault> {
        let mut stores_guard = self.open_stores.lock().expect("LOCK_POISONED: Store hub");
        if let Some(existing) = stores_guard.get(name) {
            return Ok(Arc::clone(existing));
        }
        let opened = Arc::new(RecordStore::open(&self.root, name)?);
        stores_guard.insert(name.to_string(), Arc::clone(&opened));
        Ok(opened)
    }
}
