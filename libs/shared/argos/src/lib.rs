// [libs/shared/argos/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ARGOS NEURAL OBSERVER (V10.0 - FABRIC GOLD)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: TRAZADO DEL COORDINADOR Y ATRIBUCIÓN DE PÁNICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DAEMON ATTRIBUTION: Un colapso en cualquier daemon del
 *    coordinador (scan, export, horno, bomba) queda atribuido al
 *    hilo que lo ejecutaba, con coordenadas de archivo/línea como
 *    campos estructurados consultables.
 * 2. HOOK CHAINING: El escudo de pánicos encadena al hook previo en
 *    lugar de reemplazarlo; la instrumentación del anfitrión (o de
 *    un test harness) sigue recibiendo el colapso.
 * 3. DUAL MODE: Desarrollo con nombres de hilo visibles para seguir
 *    los daemons; producción en tramas JSON planas para ingesta.
 * =================================================================
 */

use std::panic::{self, PanicHookInfo};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Estratos del tejido priorizados en el filtro por defecto.
const FABRIC_STRATA: [&str; 5] = [
    "telar_core_index",
    "telar_core_transfer",
    "telar_core_planner",
    "telar_infra_bus",
    "telar_infra_store",
];

/// Inicializa el trazado Argos y arma el escudo de pánicos.
///
/// # Errors:
/// Entra en pánico si otro suscriptor global ya fue inicializado.
pub fn init_tracing(service_nominal_identifier: &str) {
    build_subscriber(service_nominal_identifier);
    install_panic_shield(service_nominal_identifier);

    info!(
        "👁️  [ARGOS_ONLINE]: Observability strata levelized for [{}]. Panic attribution ACTIVE.",
        service_nominal_identifier
    );
}

/// Construye e instala el suscriptor global (env-filter + dual mode).
fn build_subscriber(service_nominal_identifier: &str) {
    let environmental_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(service_nominal_identifier));

    if cfg!(debug_assertions) {
        // Desarrollo: el nombre del hilo delata qué daemon habla.
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_thread_names(true),
            )
            .init();
    } else {
        // Producción: tramas JSON planas para el colector externo.
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }
}

/// Filtro por defecto: dominio del tejido en primer plano, runtime al fondo.
fn default_filter(service_nominal_identifier: &str) -> EnvFilter {
    let domain_level = if cfg!(debug_assertions) { "debug" } else { "info" };

    let mut directives = vec![format!(
        "{}={}",
        service_nominal_identifier.replace('-', "_"),
        domain_level
    )];
    directives.extend(
        FABRIC_STRATA
            .iter()
            .map(|stratum| format!("{}={}", stratum, domain_level)),
    );
    directives.push("tokio=warn".to_string());

    directives.join(",").into()
}

/**
 * Arma el escudo de pánicos con atribución de daemon.
 *
 * El hook previo se preserva y se invoca DESPUÉS del volcado al
 * rastro, de modo que el reporte por defecto (o el del harness de
 * tests) sobreviva a la instalación del escudo.
 */
pub fn install_panic_shield(service_nominal_identifier: &str) {
    let service_id_snapshot = service_nominal_identifier.to_string();
    let chained_previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_metadata| {
        let collapsing_thread = std::thread::current();
        let daemon_attribution = collapsing_thread.name().unwrap_or("unnamed-thread");

        let (panic_file, panic_line) = panic_metadata
            .location()
            .map(|location| (location.file().to_string(), location.line()))
            .unwrap_or_else(|| ("unattributed".to_string(), 0));

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            daemon_thread = %daemon_attribution,
            file = %panic_file,
            line = panic_line,
            "🧵 [DAEMON_COLLAPSE]: {}",
            describe_panic_payload(panic_metadata)
        );

        chained_previous_hook(panic_metadata);
    }));
}

/// Extrae una descripción legible del payload de un pánico.
fn describe_panic_payload(panic_metadata: &PanicHookInfo<'_>) -> String {
    let payload = panic_metadata.payload();
    if let Some(static_message) = payload.downcast_ref::<&str>() {
        (*static_message).to_string()
    } else if let Some(owned_message) = payload.downcast_ref::<String>() {
        owned_message.clone()
    } else {
        "opaque panic payload (non-string)".to_string()
    }
}
