// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TELAR DOMAIN MODELS HUB (V12.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE CONTRATOS SOBERANOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE SOURCE OF TRUTH: Todos los estratos (Index, Transfer,
 *    Planner, Bus, Coordinator) consumen estas definiciones.
 * 2. WIRE PARITY: Los sobres del protocolo inalámbrico y los registros
 *    de tienda viven junto a las entidades de inventario para
 *    garantizar paridad de esquema bit-perfecta.
 * 3. NOMINAL PURITY: Cero abreviaciones en los nombres públicos.
 * =================================================================
 */

pub mod agent;
pub mod container;
pub mod envelope;
pub mod export;
pub mod item;
pub mod job;
pub mod recipe;
pub mod request;
pub mod shop;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use agent::{AgentHealth, AgentKind, AgentRecord, AgentStatus};
pub use container::{ContainerRole, ContainerSnapshot, SlotDetail, SlotItem, SlotMap};
pub use envelope::{CommandVerb, Envelope, MessagePayload, ShopAdvertItem, ShopAdvertInfo};
pub use export::{ExportTarget, NbtMode, SlotSpec, TargetMode};
pub use item::ItemKey;
pub use job::{Job, JobStatus, MissingMaterial};
pub use recipe::{FuelGrade, Recipe, RecipeBook, RecipeInput, SmeltRule};
pub use request::{Request, RequestStatus};
pub use shop::{Product, TransactionMetadata, TransactionRecord};
