// [apps/coordinator/src/config.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR CONFIGURATION (V21.2 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: CONFIGURACIÓN INMUTABLE CARGADA EN LA IGNICIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. IMMUTABLE BY ARC: El documento se hidrata una sola vez y viaja
 *    por referencia compartida; los contadores y cachés pertenecen a
 *    componentes nombrados, jamás a estado global mutable.
 * 2. ROLE TAXONOMY: La clasificación de contenedores es declarativa
 *    (exacto o prefijo); lo no reclamado cae en ExportBuffer, el rol
 *    seguro que la guardia del motor protege contra push ambiental.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use telar_domain_models::{ContainerRole, ExportTarget, ItemKey, RecipeBook};
use tracing::info;

/// Configuración del enlace del bus inalámbrico.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Puerto UDP del canal de difusión del tejido.
    pub channel_port: u16,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { channel_port: 17_405 }
    }
}

/// Cadencias de los bucles periódicos, en segundos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalConfig {
    pub scan_secs: u64,
    pub export_secs: u64,
    pub furnace_secs: u64,
    pub heartbeat_secs: u64,
    pub health_secs: u64,
    pub monitor_secs: u64,
    pub progress_secs: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            scan_secs: 30,
            export_secs: 3,
            furnace_secs: 5,
            heartbeat_secs: 10,
            health_secs: 5,
            monitor_secs: 2,
            progress_secs: 2,
        }
    }
}

/// Umbrales de salud derivada de agentes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub degraded_after_ms: u64,
    pub offline_after_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            degraded_after_ms: 30_000,
            offline_after_ms: 120_000,
        }
    }
}

/// Taxonomía declarativa de roles por nombre exacto o prefijo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default)]
    pub storage: Vec<String>,
    #[serde(default)]
    pub export_buffers: Vec<String>,
    #[serde(default)]
    pub furnaces: Vec<String>,
    #[serde(default)]
    pub agent_inboxes: Vec<String>,
    #[serde(default)]
    pub manipulators: Vec<String>,
}

impl RoleConfig {
    fn matches(entries: &[String], container: &str) -> bool {
        entries
            .iter()
            .any(|entry| container == entry || container.starts_with(entry.as_str()))
    }

    /**
     * Clasifica un contenedor descubierto. Los no reclamados caen en
     * ExportBuffer: nunca son destino de drenaje ni de push sin una
     * política configurada.
     */
    pub fn classify(&self, container: &str) -> ContainerRole {
        if Self::matches(&self.storage, container) {
            ContainerRole::Storage
        } else if Self::matches(&self.furnaces, container) {
            ContainerRole::Furnace
        } else if Self::matches(&self.agent_inboxes, container) {
            ContainerRole::AgentInbox
        } else if Self::matches(&self.manipulators, container) {
            ContainerRole::Manipulator
        } else {
            ContainerRole::ExportBuffer
        }
    }
}

/// Objetivo de fundición sostenida del sitio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmeltTarget {
    pub item: ItemKey,
    pub qty: u32,
}

/// Configuración del orquestador de fundición.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmeltingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub targets: Vec<SmeltTarget>,
}

/// Enlace pasillo (agente) -> contenedor de dispensado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AisleBinding {
    pub agent_id: String,
    pub container: String,
}

/// Configuración del punto de venta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Nombre publicado en los adverts SHOPSYNC.
    #[serde(default)]
    pub advert_name: String,
    #[serde(default)]
    pub aisles: Vec<AisleBinding>,
}

/// Documento de configuración inmutable del coordinador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Identidad de este nodo en el bus del tejido.
    pub identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Directorio raíz de los stores persistentes.
    pub data_root: PathBuf,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub intervals: IntervalConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub roles: RoleConfig,
    #[serde(default)]
    pub export_targets: Vec<ExportTarget>,
    #[serde(default)]
    pub smelting: SmeltingConfig,
    #[serde(default)]
    pub shop: ShopConfig,
    /// Documento JSON del libro de recetas/fundición/combustible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes_path: Option<PathBuf>,
    /// Documento JSON del mundo simulado (driver de simulación).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_path: Option<PathBuf>,
}

impl CoordinatorConfig {
    /// Hidrata el documento desde disco.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw_document = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw_document)?;
        info!("🧾 [CONFIG]: Document hydrated from {} ({} export targets).",
            path.display(), config.export_targets.len());
        Ok(config)
    }

    /// Hidrata el libro de recetas referenciado (vacío si no hay ruta).
    pub fn load_recipe_book(&self) -> anyhow::Result<RecipeBook> {
        match &self.recipes_path {
            Some(recipes_path) => {
                let raw_document = std::fs::read_to_string(recipes_path)?;
                Ok(serde_json::from_str(&raw_document)?)
            }
            None => Ok(RecipeBook::default()),
        }
    }

    /// Configuración mínima apta para Proving Grounds.
    pub fn for_testing(data_root: PathBuf) -> Self {
        Self {
            identity: "coordinator".into(),
            label: Some("Telar Test Node".into()),
            data_root,
            bus: BusConfig::default(),
            intervals: IntervalConfig::default(),
            health: HealthConfig::default(),
            roles: RoleConfig::default(),
            export_targets: Vec::new(),
            smelting: SmeltingConfig::default(),
            shop: ShopConfig::default(),
            recipes_path: None,
            world_path: None,
        }
    }
}
