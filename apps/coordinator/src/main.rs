// [apps/coordinator/src/main.rs]
/*!
 * =================================================================
 * APARATO: COORDINATOR SHELL (V22.0 - FABRIC GOLD)
 * CLASIFICACIÓN: APPLICATION LAYER (ENTRY POINT)
 * RESPONSABILIDAD: BOOTSTRAP DE ENTORNO E IGNICIÓN DEL KERNEL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ARCHITECTURAL PURITY: El shell solo parsea directivas, levanta
 *    la observabilidad y delega la totalidad de la operación al
 *    CoordinatorKernel.
 * 2. ERROR TRIAGE: Manejo rico de fallos durante la fase de
 *    ignición inicial; un documento de configuración inválido
 *    aborta antes de tocar el tejido.
 * =================================================================
 */

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use telar_coordinator::config::CoordinatorConfig;
use telar_coordinator::kernel::CoordinatorKernel;
use tracing::info;

/**
 * Directivas de mando para el coordinador soberano.
 * Configuración inyectada vía CLI o variables de entorno.
 */
#[derive(Parser, Debug)]
#[command(
    author = "Raz Podesta <metaShark Tech>",
    version = "22.0",
    about = "Telar Sovereign Fabric Coordinator // Item-Fabric Control Plane"
)]
struct SovereignCoordinatorDirectives {
    /// Ruta del documento de configuración del sitio.
    #[arg(long, env = "TELAR_CONFIG", default_value = "telar.json")]
    config_path: PathBuf,
}

/**
 * Punto de ignición del binario del coordinador.
 *
 * # Errors:
 * - `CONFIG_FAULT`: documento de configuración ilegible o inválido.
 * - `LINK_FAULT`: el puerto del canal del bus está tomado.
 */
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. ENTORNO Y OBSERVABILIDAD
    dotenvy::dotenv().ok();
    telar_shared_argos::init_tracing("telar-coordinator");

    info!("💠 [SHELL]: Global Initiation Sequence V22.0 starting...");

    // 2. PARSEO DE DIRECTIVAS ESTRATÉGICAS
    let directives = SovereignCoordinatorDirectives::parse();

    // 3. HIDRATACIÓN DEL DOCUMENTO DE CONFIGURACIÓN
    let config = CoordinatorConfig::load(&directives.config_path)
        .with_context(|| format!("CONFIG_FAULT: Unable to hydrate {}", directives.config_path.display()))?;

    // 4. IGNICIÓN Y TRANSFERENCIA DE MANDO AL KERNEL
    let kernel = CoordinatorKernel::ignite(config)
        .await
        .context("IGNITION_FAULT: Kernel bootstrap collapsed")?;

    info!("🚀 [SHELL]: Handing control to CoordinatorKernel. Transitioning to OPERATIONAL.");
    kernel.launch_sovereign_operations().await
}
