// [libs/domain/models/src/recipe.rs]
/*!
 * =================================================================
 * APARATO: RECIPE LIBRARY MODELS (V12.1 - FABRIC GOLD)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: FORMA CONTRACTUAL DE RECETAS, FUNDICIÓN Y COMBUSTIBLE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SHAPE AS CONTRACT: La corrección de los datos es externa; la
 *    forma (input -> output, fuel -> smelts) es parte del contrato
 *    y se certifica con recetas sintéticas en Proving Grounds.
 * 2. JSON HYDRATION: El libro se hidrata desde un documento JSON
 *    inyectado en la ignición del coordinador.
 * =================================================================
 */

use crate::item::ItemKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Insumo de una receta: identidad y unidades por invocación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInput {
    pub item: ItemKey,
    pub count: u32,
}

/// Receta de crafteo: insumos exactos por invocación y rendimiento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub output: ItemKey,
    /// Unidades producidas por invocación (ej. 4 planks por log).
    pub output_count: u32,
    pub inputs: Vec<RecipeInput>,
}

/// Regla de fundición: base-id de entrada -> identidad de salida.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmeltRule {
    pub input: String,
    pub output: ItemKey,
}

/// Grado de combustible con su rendimiento en operaciones de fundición.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelGrade {
    pub item: ItemKey,
    /// Operaciones de fundición por unidad de combustible.
    pub smelts_per_unit: u32,
}

/// Biblioteca inmutable de definiciones, indexada por base-id de salida.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBook {
    #[serde(default)]
    craft: HashMap<String, Recipe>,
    #[serde(default)]
    smelt: HashMap<String, SmeltRule>,
    /// Lista de prioridad de combustible del sitio (orden descendente).
    #[serde(default)]
    fuels: Vec<FuelGrade>,
}

impl RecipeBook {
    /// Construye una biblioteca desde colecciones ya materializadas.
    pub fn new(craft_recipes: Vec<Recipe>, smelt_rules: Vec<SmeltRule>, fuels: Vec<FuelGrade>) -> Self {
        let craft = craft_recipes
            .into_iter()
            .map(|recipe| (recipe.output.base_id.clone(), recipe))
            .collect();
        let smelt = smelt_rules
            .into_iter()
            .map(|rule| (rule.output.base_id.clone(), rule))
            .collect();
        Self { craft, smelt, fuels }
    }

    /// Receta de crafteo cuyo output tiene el base-id dado.
    pub fn craft_recipe(&self, output_base_id: &str) -> Option<&Recipe> {
        self.craft.get(output_base_id)
    }

    /// ¿Existe una regla de fundición que produzca este base-id?
    pub fn is_smeltable(&self, output_base_id: &str) -> bool {
        self.smelt.contains_key(output_base_id)
    }

    /// Regla de fundición que produce el base-id dado.
    pub fn smelt_rule(&self, output_base_id: &str) -> Option<&SmeltRule> {
        self.smelt.get(output_base_id)
    }

    /// Prioridad de combustible del sitio, de mayor a menor preferencia.
    pub fn fuel_priority(&self) -> &[FuelGrade] {
        &self.fuels
    }
}
