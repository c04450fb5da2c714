// [libs/domain/models/src/tests_contracts.rs]
/**
 * =================================================================
 * APARATO: DOMAIN CONTRACTS TEST (V12.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE CODECS Y CONTRATOS DE DOMINIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TEXTUAL PARITY: Valida que el codec textual de ItemKey preserve
 *    los namespaces con ':' y distinga sufijos hexadecimales de 32
 *    caracteres como huellas NBT.
 * 2. WIRE SHAPE: Certifica el discriminador 'type'/'data' de los
 *    sobres del protocolo contra drift de esquema.
 * 3. GRAMMAR INTEGRITY: Valida la gramática de metadatos de compra
 *    incluyendo la detección de claves de operador.
 * =================================================================
 */
