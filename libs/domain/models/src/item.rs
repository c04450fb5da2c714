// [libs/domain/models/src/item.rs]
/*!
 * =================================================================
 * APARATO: ITEM IDENTITY MODEL (V12.0 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: IDENTIDAD CANÓNICA DE ÍTEMS Y CODEC TEXTUAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OPAQUE NBT: El hash NBT es material opaco. El sistema lo compara,
 *    jamás interpreta sus bytes.
 * 2. TEXTUAL CODEC: La forma 'base-id' o 'base-id:nbt-hash' es el
 *    formato de transporte para stores JSON y claves de mapa.
 * 3. DETERMINISM: Orden total (Ord) para iteraciones reproducibles en
 *    índices derivados y planes de transferencia.
 *
 * # Mathematical Proof (Parse Disambiguation):
 * Los base-id contienen un ':' de namespace (ej. 'minecraft:coal').
 * El segmento final solo se interpreta como hash NBT si es hexadecimal
 * en minúsculas de exactamente 32 caracteres; cualquier otro sufijo
 * pertenece al base-id. La función parse es por tanto total.
 * =================================================================
 */

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longitud nominal de un hash NBT (MD5 hexadecimal en minúsculas).
const NBT_HASH_HEX_LENGTH: usize = 32;

/// Identidad canónica de un ítem: (base-id, hash NBT opcional).
///
/// La igualdad es por componentes. Un 'base match' ignora el hash;
/// un 'exact match' exige ambos componentes idénticos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    /// Identificador base con namespace (ej. 'minecraft:iron_ingot').
    pub base_id: String,
    /// Huella NBT opaca, presente solo en variantes etiquetadas.
    pub nbt_hash: Option<String>,
}

impl ItemKey {
    /// Construye una identidad sin material NBT.
    pub fn bare(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            nbt_hash: None,
        }
    }

    /// Construye una identidad con huella NBT explícita.
    pub fn with_hash(base_id: impl Into<String>, nbt_hash: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            nbt_hash: Some(nbt_hash.into()),
        }
    }

    /**
     * Decodifica la forma textual 'base-id' o 'base-id:nbt-hash'.
     *
     * # Logic:
     * Solo un sufijo hexadecimal de 32 caracteres tras el último ':'
     * se considera hash NBT; el resto del texto es el base-id íntegro.
     */
    pub fn parse(encoded_identity: &str) -> Self {
        if let Some((base_segment, candidate_hash)) = encoded_identity.rsplit_once(':') {
            if is_nbt_hash_segment(candidate_hash) {
                return Self::with_hash(base_segment, candidate_hash);
            }
        }
        Self::bare(encoded_identity)
    }

    /// Comparación por base-id ignorando la huella NBT.
    pub fn matches_base(&self, other_base_id: &str) -> bool {
        self.base_id == other_base_id
    }

    /// Forma textual canónica (dual de `parse`).
    pub fn encoded(&self) -> String {
        match &self.nbt_hash {
            Some(hash_segment) => format!("{}:{}", self.base_id, hash_segment),
            None => self.base_id.clone(),
        }
    }
}

/// Certifica que un segmento tenga la forma de huella NBT opaca.
fn is_nbt_hash_segment(segment: &str) -> bool {
    segment.len() == NBT_HASH_HEX_LENGTH
        && segment
            .chars()
            .all(|character| character.is_ascii_hexdigit() && !character.is_ascii_uppercase())
}

impl fmt::Display for ItemKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nbt_hash {
            Some(hash_segment) => write!(formatter, "{}:{}", self.base_id, hash_segment),
            None => write!(formatter, "{}", self.base_id),
        }
    }
}

// --- CODEC SERDE SOBERANO (FORMA TEXTUAL) ---
// Las claves de mapa en stores JSON exigen serialización a String.

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded())
    }
}

struct ItemKeyVisitor;

impl Visitor<'_> for ItemKeyVisitor {
    type Value = ItemKey;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an item identity in 'base-id' or 'base-id:nbt-hash' form")
    }

    fn visit_str<E: de::Error>(self, encoded_identity: &str) -> Result<ItemKey, E> {
        Ok(ItemKey::parse(encoded_identity))
    }
}

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(ItemKeyVisitor)
    }
}
